use ndarray::array;

use super::{normalize, FeatureLimit, FeatureLimits};

fn limits() -> FeatureLimits {
    FeatureLimits(vec![
        FeatureLimit::new(0.0, 10.0),
        FeatureLimit::new(3.0, 3.0),
        FeatureLimit::new(-5.0, 5.0),
    ])
}

#[test]
fn test_limits_ignore_missing_values() {
    let features = array![
        [1.0, 3.0, f64::NAN],
        [4.0, 3.0, 2.0],
        [f64::NAN, 3.0, -1.0],
    ];
    let limits = FeatureLimits::from_features(&features);
    assert_eq!(
        limits,
        FeatureLimits(vec![
            FeatureLimit::new(1.0, 4.0),
            FeatureLimit::new(3.0, 3.0),
            FeatureLimit::new(-1.0, 2.0),
        ])
    );
    assert_eq!(limits.selected_features(), vec![0, 2]);
}

#[test]
fn test_limits_of_missing_feature() {
    let features = array![[1.0, f64::NAN], [2.0, f64::NAN]];
    let limits = FeatureLimits::from_features(&features);
    assert!(limits.0[1].is_constant());
    assert_eq!(limits.selected_features(), vec![0]);
}

#[test]
fn test_normalize_drops_constant_features() {
    let normalized =
        normalize(&[5.0, 3.0, 0.0], &limits(), -1.0, 1.0, -1.0).unwrap();
    assert_eq!(normalized, vec![0.0, 0.0]);
}

#[test]
fn test_normalize_missing_and_out_of_range() {
    let normalized =
        normalize(&[f64::NAN, 7.0, 100.0], &limits(), -1.0, 1.0, 0.5)
            .unwrap();
    assert_eq!(normalized, vec![0.5, 1.0]);
    let normalized =
        normalize(&[-3.0, 7.0, -6.0], &limits(), 0.0, 1.0, 0.5).unwrap();
    assert_eq!(normalized, vec![0.0, 0.0]);
}

#[test]
fn test_normalize_stays_in_bounds() {
    let limits = FeatureLimits(vec![FeatureLimit::new(0.1, 0.7)]);
    for step in 0..=100 {
        let value = step as f64 / 100.0;
        let normalized = normalize(&[value], &limits, -1.0, 1.0, 0.0).unwrap();
        assert!((-1.0..=1.0).contains(&normalized[0]));
    }
}

#[test]
fn test_normalize_length_mismatch() {
    assert!(normalize(&[1.0, 2.0], &limits(), -1.0, 1.0, -1.0).is_err());
}
