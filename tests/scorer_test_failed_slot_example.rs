use std::collections::HashMap;

use sunny_as::{csv_parser::RuntimeTable, datastructures::*, scorer::score_fold};

#[test]
fn test_failed_slot_example() {
    let ground_truth = RuntimeTable::from_records(
        &[
            RuntimeRecord::new("x", "A", RunStatus::Timeout, Some(100.0)),
            RuntimeRecord::new("x", "B", RunStatus::Ok, Some(50.0)),
        ],
        100.0,
    )
    .unwrap();
    let predictions = vec![Prediction::new("x", "A,30,B,70".parse().unwrap())];
    let stats =
        score_fold(&predictions, &ground_truth, 100.0, &HashMap::new()).unwrap();
    assert_eq!(stats.n, 1);
    assert_eq!(stats.solved, 1);
    assert_eq!(stats.penalized, 0);
    assert_eq!(stats.par10, 80.0);
    assert_eq!(stats.par10_vbs, 50.0);
    let summary = stats.summary().unwrap();
    assert_eq!(summary.fsi, 1.0);
    assert_eq!(summary.par10, 80.0);
}
