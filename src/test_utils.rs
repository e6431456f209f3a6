use std::{collections::HashMap, path::PathBuf};

use crate::{
    csv_parser::Scenario,
    datastructures::*,
    knowledge_base::KnowledgeBaseEntry,
};

pub const TOY_SCENARIO: &str = "data/test/scenario";

pub fn toy_scenario() -> Scenario {
    Scenario::from_dir(&PathBuf::from(TOY_SCENARIO)).unwrap()
}

pub fn ok(time: f64) -> Outcome {
    Outcome::new(RunStatus::Ok, time)
}

pub fn failed(time: f64) -> Outcome {
    Outcome::new(RunStatus::Timeout, time)
}

pub fn entry(
    instance: &str,
    features: Vec<f64>,
    outcomes: &[(&str, Outcome)],
) -> KnowledgeBaseEntry {
    KnowledgeBaseEntry {
        instance: instance.to_string(),
        features,
        outcomes: outcomes
            .iter()
            .map(|(solver, outcome)| (solver.to_string(), *outcome))
            .collect::<HashMap<_, _>>(),
    }
}

pub fn solvers(names: &[&str]) -> Vec<Solver> {
    names.iter().map(|name| name.to_string()).collect()
}

pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join(format!("sunny_as_{}_{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
