use std::collections::HashSet;

use ndarray::Axis;

use super::{read_predictions, write_predictions, RuntimeTable, Scenario};
use crate::{datastructures::*, test_utils::*};

#[test]
fn test_read_scenario() {
    let scenario = toy_scenario();
    assert_eq!(scenario.description.scenario_id, "toy");
    assert_eq!(scenario.portfolio(), solvers(&["A", "B", "C"]).as_slice());
    assert_eq!(scenario.timeout(), 100.0);
    assert_eq!(scenario.runs.len(), 21);
    assert_eq!(
        scenario.instances(),
        ["i1", "i2", "i3", "i4", "i5", "i6", "i7"]
    );
    assert_eq!(scenario.features.num_features(), 3);
}

#[test]
fn test_first_repetition_and_missing_values() {
    let scenario = toy_scenario();
    let values = &scenario.features.values;
    assert_eq!(values.index_axis(Axis(0), 0).to_vec(), vec![0.0, 10.0, 5.0]);
    assert!(values[[2, 1]].is_nan());
    assert_eq!(values[[2, 0]], 2.0);
}

#[test]
fn test_runtime_records() {
    let scenario = toy_scenario();
    let i7_c = scenario
        .runs
        .iter()
        .find(|run| run.instance == "i7" && run.solver == "C")
        .unwrap();
    assert_eq!(i7_c.status, RunStatus::Timeout);
    assert_eq!(i7_c.runtime, None);
    let i6_a = &scenario.runs[15];
    assert_eq!((i6_a.instance.as_str(), i6_a.solver.as_str()), ("i6", "A"));
    assert_eq!(i6_a.status, RunStatus::Memout);
}

#[test]
fn test_feature_costs() {
    let scenario = toy_scenario();
    assert_eq!(scenario.feature_cost("i1"), 3.0);
    assert_eq!(scenario.feature_cost("i2"), 1.0);
    assert_eq!(scenario.feature_cost("i5"), 1.0);
    assert_eq!(scenario.feature_cost("unknown"), 0.0);
}

#[test]
fn test_runtime_table() {
    let scenario = toy_scenario();
    let table = RuntimeTable::from_records(&scenario.runs, scenario.timeout())
        .unwrap();
    assert_eq!(table.len(), 7);
    assert_eq!(table.best_time("i1").unwrap(), Some(5.0));
    assert_eq!(table.best_time("i4").unwrap(), Some(4.0));
    assert_eq!(table.best_time("i7").unwrap(), None);
    assert_eq!(
        *table.outcome("i7", "C").unwrap(),
        Outcome::new(RunStatus::Timeout, 100.0)
    );
    assert_eq!(
        *table.outcome("i3", "B").unwrap(),
        Outcome::new(RunStatus::Crash, 3.0)
    );
    assert!(table.outcome("i8", "A").is_err());
    assert!(table.outcome("i1", "D").is_err());
}

#[test]
fn test_ok_run_without_runtime_is_rejected() {
    let records = vec![RuntimeRecord::new("x", "A", RunStatus::Ok, None)];
    assert!(RuntimeTable::from_records(&records, 10.0).is_err());
}

#[test]
fn test_restrict() {
    let scenario = toy_scenario();
    let keep: HashSet<String> =
        ["i2", "i5"].iter().map(|i| i.to_string()).collect();
    let sub = scenario.restrict(&keep);
    assert_eq!(sub.instances(), ["i2", "i5"]);
    assert_eq!(sub.runs.len(), 6);
    assert_eq!(sub.features.values.nrows(), 2);
    assert_eq!(sub.features.values[[1, 0]], 9.0);
    assert_eq!(sub.feature_costs.len(), 2);
    assert_eq!(sub.description, scenario.description);
}

#[test]
fn test_write_and_read_scenario() {
    let scenario = toy_scenario();
    let dir = temp_dir("scenario_roundtrip");
    scenario.write_to_dir(&dir).unwrap();
    let copy = Scenario::from_dir(&dir).unwrap();
    assert_eq!(copy.description, scenario.description);
    assert_eq!(copy.runs, scenario.runs);
    assert_eq!(copy.instances(), scenario.instances());
    assert!(copy.features.values[[2, 1]].is_nan());
    assert_eq!(copy.features.values[[5, 1]], 34.0);
    assert_eq!(copy.feature_cost("i1"), 3.0);
    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_missing_scenario_dir() {
    assert!(Scenario::from_dir(&temp_dir("empty_scenario")).is_err());
}

#[test]
fn test_predictions_file() {
    let predictions = vec![
        Prediction::new("i1", "A,30,B,70".parse().unwrap()),
        Prediction::new("i2", "C,100".parse().unwrap()),
        Prediction::new("i3", Schedule::default()),
    ];
    let dir = temp_dir("predictions");
    let path = dir.join("predictions.csv");
    write_predictions(&predictions, &path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("instance_id,run_id,solver,time_limit"));
    assert!(content.contains("i1,2,B,70"));
    // instances with an empty schedule produce no rows
    assert_eq!(read_predictions(&path).unwrap(), predictions[..2].to_vec());
    std::fs::remove_dir_all(dir).unwrap();
}
