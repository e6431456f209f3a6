use sunny_as::cross_validation::{evaluate, split_folds, EvaluationSettings};
mod common;
use common::*;

#[test]
fn test_toy_scenario() {
    let scenario = toy_scenario();
    let settings = EvaluationSettings {
        num_folds: 3,
        seed: 11,
        ..EvaluationSettings::default()
    };
    let folds = split_folds(scenario.instances(), 3, 11).unwrap();
    assert_eq!(folds.iter().map(|fold| fold.test.len()).sum::<usize>(), 7);

    let stats = evaluate(&scenario, &settings).unwrap();
    assert_eq!(stats.n, 7);
    assert_eq!(stats.m, 6);
    assert_eq!(stats.solved + stats.penalized, 7);
    assert!(stats.penalized >= 1);
    let summary = stats.summary().unwrap();
    assert!(summary.fsi <= summary.fsi_vbs);
    assert!(summary.par10 >= summary.par10_vbs);
}
