use super::Predictor;
use crate::{
    datastructures::*, knowledge_base::KnowledgeBase, test_utils::*,
};

fn toy_kb() -> KnowledgeBase {
    KnowledgeBase::build(&toy_scenario(), &TrainConfig::default()).unwrap()
}

fn assert_schedule(schedule: &Schedule, expected: &[(&str, f64)]) {
    assert_eq!(schedule.len(), expected.len(), "{schedule}");
    for ((solver, time), (expected_solver, expected_time)) in
        schedule.steps.iter().zip(expected)
    {
        assert_eq!(solver, expected_solver);
        assert!((time - expected_time).abs() < 1e-6, "{schedule}");
    }
}

const NEAR_I1: [f64; 3] = [0.0, 10.0, 5.0];
const NEAR_I6: [f64; 3] = [10.0, 34.0, 5.0];

#[test]
fn test_default_queries() {
    let kb = toy_kb();
    let predictor = Predictor::new(&kb, QueryOverrides::default()).unwrap();
    assert_eq!(predictor.backup().unwrap(), "C");
    assert_schedule(&predictor.predict(&NEAR_I1, 0.0).unwrap(), &[("A", 100.0)]);
    assert_schedule(&predictor.predict(&NEAR_I6, 0.0).unwrap(), &[("B", 100.0)]);
}

#[test]
fn test_feature_cost_reduces_budget() {
    let kb = toy_kb();
    let predictor = Predictor::new(&kb, QueryOverrides::default()).unwrap();
    assert_schedule(&predictor.predict(&NEAR_I6, 10.0).unwrap(), &[("B", 90.0)]);
    assert!(predictor.predict(&NEAR_I6, 100.0).unwrap().is_empty());
}

#[test]
fn test_static_schedule_runs_first() {
    let kb = toy_kb();
    let overrides = QueryOverrides {
        static_schedule: Some("A,20".parse().unwrap()),
        ..QueryOverrides::default()
    };
    let predictor = Predictor::new(&kb, overrides).unwrap();
    assert_schedule(
        &predictor.predict(&NEAR_I6, 0.0).unwrap(),
        &[("A", 20.0), ("B", 80.0)],
    );
}

#[test]
fn test_dynamic_part_alone() {
    let kb = toy_kb();
    let overrides = QueryOverrides {
        static_schedule: Some("A,20".parse().unwrap()),
        ..QueryOverrides::default()
    };
    let predictor = Predictor::new(&kb, overrides).unwrap();
    assert_schedule(
        &predictor.predict_dynamic(&NEAR_I6, 0.0).unwrap(),
        &[("B", 80.0)],
    );
    assert!(predictor.predict_dynamic(&NEAR_I6, 80.0).unwrap().is_empty());
}

#[test]
fn test_portfolio_and_backup_overrides() {
    let kb = toy_kb();
    let overrides = QueryOverrides {
        portfolio: Some(solvers(&["A", "C"])),
        ..QueryOverrides::default()
    };
    let predictor = Predictor::new(&kb, overrides.clone()).unwrap();
    assert_schedule(&predictor.predict(&NEAR_I6, 0.0).unwrap(), &[("C", 100.0)]);

    let overrides = QueryOverrides {
        backup: Some("A".to_string()),
        ..overrides
    };
    let predictor = Predictor::new(&kb, overrides).unwrap();
    assert_schedule(
        &predictor.predict(&NEAR_I6, 0.0).unwrap(),
        &[("C", 200.0 / 3.0), ("A", 100.0 / 3.0)],
    );
}

#[test]
fn test_empty_neighborhood() {
    let kb = toy_kb();
    let overrides = QueryOverrides {
        k: Some(0),
        ..QueryOverrides::default()
    };
    let predictor = Predictor::new(&kb, overrides).unwrap();
    assert!(predictor.predict(&NEAR_I1, 0.0).unwrap().is_empty());
}

#[test]
fn test_invalid_overrides() {
    let kb = toy_kb();
    let unknown_solver = QueryOverrides {
        portfolio: Some(solvers(&["A", "Z"])),
        ..QueryOverrides::default()
    };
    assert!(Predictor::new(&kb, unknown_solver).is_err());
    let unknown_backup = QueryOverrides {
        backup: Some("Z".to_string()),
        ..QueryOverrides::default()
    };
    assert!(Predictor::new(&kb, unknown_backup).is_err());
    let bad_timeout = QueryOverrides {
        timeout: Some(0.0),
        ..QueryOverrides::default()
    };
    assert!(Predictor::new(&kb, bad_timeout).is_err());
}

#[test]
fn test_raw_feature_length_mismatch() {
    let kb = toy_kb();
    let predictor = Predictor::new(&kb, QueryOverrides::default()).unwrap();
    assert!(predictor.predict(&[1.0, 2.0], 0.0).is_err());
}
