use anyhow::{ensure, Result};
use log::warn;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Smallest and largest value of a feature.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FeatureLimit {
    /// Smallest observed value.
    pub min: f64,
    /// Largest observed value.
    pub max: f64,
}

impl FeatureLimit {
    /// Limit `[min, max]`.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Constant features carry no information and are dropped on
    /// normalization.
    pub fn is_constant(&self) -> bool {
        self.min == self.max
    }

    fn scale(&self, value: f64, lb: f64, ub: f64, default: f64) -> f64 {
        if value.is_nan() {
            default
        } else if value < self.min {
            lb
        } else if value > self.max {
            ub
        } else {
            let x = (value - self.min) / (self.max - self.min);
            (lb + (ub - lb) * x).max(lb).min(ub)
        }
    }
}

/// Per-feature `(min, max)` observed in the training data.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FeatureLimits(pub Vec<FeatureLimit>);

impl FeatureLimits {
    /// Column-wise limits of an instance x feature matrix, ignoring missing
    /// (`NaN`) values. Columns without any value get the constant limit `(0, 0)`.
    pub fn from_features(features: &Array2<f64>) -> Self {
        let limits = features
            .columns()
            .into_iter()
            .enumerate()
            .map(|(j, column)| match column_limit(column) {
                Some(limit) => limit,
                None => {
                    warn!("Feature {j} has no numeric value, treating it as constant");
                    FeatureLimit::new(0.0, 0.0)
                }
            })
            .collect();
        FeatureLimits(limits)
    }

    /// Number of features, constant ones included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no features.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Limits in feature order.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureLimit> {
        self.0.iter()
    }

    /// Indices of the features that survive normalization.
    pub fn selected_features(&self) -> Vec<usize> {
        self.iter()
            .enumerate()
            .filter(|(_, limit)| !limit.is_constant())
            .map(|(j, _)| j)
            .collect()
    }
}

fn column_limit(column: ArrayView1<f64>) -> Option<FeatureLimit> {
    column
        .iter()
        .filter(|v| !v.is_nan())
        .fold(None, |limit, &v| match limit {
            None => Some(FeatureLimit::new(v, v)),
            Some(FeatureLimit { min, max }) => {
                Some(FeatureLimit::new(min.min(v), max.max(v)))
            }
        })
}

/// Scales `raw` into `[lb, ub]` feature by feature.
///
/// Constant features are dropped, missing values become `default` and values
/// outside the training limits are clamped to the bounds.
pub fn normalize(
    raw: &[f64],
    limits: &FeatureLimits,
    lb: f64,
    ub: f64,
    default: f64,
) -> Result<Vec<f64>> {
    ensure!(
        raw.len() == limits.len(),
        "feature vector has {} values, expected {}",
        raw.len(),
        limits.len()
    );
    Ok(raw
        .iter()
        .zip(limits.iter())
        .filter(|(_, limit)| !limit.is_constant())
        .map(|(&value, limit)| limit.scale(value, lb, ub, default))
        .collect())
}

#[cfg(test)]
mod tests;
