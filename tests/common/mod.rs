#![allow(dead_code)]
use std::path::PathBuf;

use sunny_as::{
    csv_parser::Scenario, datastructures::*, knowledge_base::KnowledgeBase,
};

pub const TOY_SCENARIO: &str = "data/test/scenario";

pub fn toy_scenario() -> Scenario {
    Scenario::from_dir(&PathBuf::from(TOY_SCENARIO)).unwrap()
}

pub fn toy_kb() -> KnowledgeBase {
    KnowledgeBase::build(&toy_scenario(), &TrainConfig::default()).unwrap()
}

pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join(format!("sunny_as_it_{}_{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn raw_features(scenario: &Scenario, instance: &str) -> Vec<f64> {
    scenario
        .features
        .iter()
        .find(|(name, _)| name.as_str() == instance)
        .map(|(_, raw)| raw.to_vec())
        .unwrap()
}
