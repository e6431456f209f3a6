use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};

use anyhow::{ensure, Context, Result};
use itertools::Itertools;
use log::info;
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::datastructures::*;

mod utils;
pub use utils::{
    print_predictions, read_feature_costs, read_features, read_predictions,
    read_runtimes, write_feature_costs, write_features, write_predictions,
    write_runtimes,
};

/// Scenario metadata (JSON).
pub const DESCRIPTION_FILE: &str = "description.json";
/// Runtime table of every solver on every instance.
pub const RUNTIMES_FILE: &str = "algorithm_runs.csv";
/// Feature vectors, one row per instance and repetition.
pub const FEATURES_FILE: &str = "feature_values.csv";
/// Optional cost of computing the features.
pub const FEATURE_COSTS_FILE: &str = "feature_costs.csv";

/// Contents of `description.json`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScenarioDescription {
    /// Name of the scenario.
    pub scenario_id: String,
    /// Cutoff time of every solver run.
    #[serde(rename = "algorithm_cutoff_time")]
    pub timeout: f64,
    /// Names of the solvers.
    #[serde(rename = "algorithms")]
    pub portfolio: Vec<Solver>,
    /// Feature columns, in feature vector order.
    pub features: Vec<String>,
}

/// Raw feature vectors, one row per instance. Missing values are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    /// Row names.
    pub instances: Vec<String>,
    /// Instance x feature matrix.
    pub values: Array2<f64>,
}

impl FeatureTable {
    /// Fails if there is not exactly one row per instance.
    pub fn new(instances: Vec<String>, values: Array2<f64>) -> Result<Self> {
        ensure!(
            instances.len() == values.nrows(),
            "{} instances but {} feature rows",
            instances.len(),
            values.nrows()
        );
        Ok(Self { instances, values })
    }

    /// Number of feature columns.
    pub fn num_features(&self) -> usize {
        self.values.ncols()
    }

    /// Number of instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether there are no instances.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Instance names with their raw feature vectors.
    pub fn iter(&self) -> impl Iterator<Item = (&String, ArrayView1<f64>)> {
        self.instances.iter().zip(self.values.rows())
    }

    fn restrict(&self, instances: &HashSet<String>) -> Self {
        let rows = self
            .instances
            .iter()
            .positions(|instance| instances.contains(instance))
            .collect_vec();
        Self {
            instances: rows
                .iter()
                .map(|&row| self.instances[row].clone())
                .collect(),
            values: self.values.select(Axis(0), &rows),
        }
    }
}

/// An algorithm selection scenario: description, runtimes and features.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Solvers, features and cutoff.
    pub description: ScenarioDescription,
    /// Every row of the runtime table.
    pub runs: Vec<RuntimeRecord>,
    /// Raw feature vectors.
    pub features: FeatureTable,
    /// Feature computation time per instance, empty if unknown.
    pub feature_costs: HashMap<String, f64>,
}

impl Scenario {
    /// Fails if the feature vectors do not match the declared features.
    pub fn new(
        description: ScenarioDescription,
        runs: Vec<RuntimeRecord>,
        features: FeatureTable,
        feature_costs: HashMap<String, f64>,
    ) -> Result<Self> {
        ensure!(
            features.num_features() == description.features.len(),
            "scenario declares {} features but feature vectors have {}",
            description.features.len(),
            features.num_features()
        );
        Ok(Self {
            description,
            runs,
            features,
            feature_costs,
        })
    }

    /// Reads a scenario directory. The feature cost file is optional.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let description: ScenarioDescription = serde_json::from_str(
            &fs::read_to_string(dir.join(DESCRIPTION_FILE)).with_context(
                || format!("no scenario description in {}", dir.display()),
            )?,
        )?;
        let runs = read_runtimes(&dir.join(RUNTIMES_FILE))?;
        let features =
            read_features(&dir.join(FEATURES_FILE), &description.features)?;
        let costs_path = dir.join(FEATURE_COSTS_FILE);
        let feature_costs = if costs_path.exists() {
            read_feature_costs(&costs_path)?
        } else {
            HashMap::new()
        };
        info!(
            "Read scenario {}: {} instances, {} solvers, {} features",
            description.scenario_id,
            features.len(),
            description.portfolio.len(),
            description.features.len()
        );
        Scenario::new(description, runs, features, feature_costs)
    }

    /// Writes the scenario in the layout read by [`Scenario::from_dir`].
    pub fn write_to_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        serde_json::to_writer_pretty(
            fs::File::create(dir.join(DESCRIPTION_FILE))?,
            &self.description,
        )?;
        write_runtimes(&self.runs, &dir.join(RUNTIMES_FILE))?;
        write_features(
            &self.features,
            &self.description.features,
            &dir.join(FEATURES_FILE),
        )?;
        if !self.feature_costs.is_empty() {
            let costs = self
                .features
                .instances
                .iter()
                .filter_map(|instance| {
                    self.feature_costs
                        .get(instance)
                        .map(|&cost| (instance.clone(), cost))
                })
                .collect_vec();
            write_feature_costs(&costs, &dir.join(FEATURE_COSTS_FILE))?;
        }
        Ok(())
    }

    /// Solvers of the scenario.
    pub fn portfolio(&self) -> &[Solver] {
        &self.description.portfolio
    }

    /// Cutoff time of the scenario.
    pub fn timeout(&self) -> f64 {
        self.description.timeout
    }

    /// Instances with a feature vector, in file order.
    pub fn instances(&self) -> &[String] {
        &self.features.instances
    }

    /// 0 if the cost of `instance` is unknown.
    pub fn feature_cost(&self, instance: &str) -> f64 {
        self.feature_costs.get(instance).copied().unwrap_or(0.0)
    }

    /// The sub-scenario containing only the given instances.
    pub fn restrict(&self, instances: &HashSet<String>) -> Self {
        Self {
            description: self.description.clone(),
            runs: self
                .runs
                .iter()
                .filter(|run| instances.contains(&run.instance))
                .cloned()
                .collect(),
            features: self.features.restrict(instances),
            feature_costs: self
                .feature_costs
                .iter()
                .filter(|(instance, _)| instances.contains(*instance))
                .map(|(instance, &cost)| (instance.clone(), cost))
                .collect(),
        }
    }
}

/// Observed outcomes per instance and solver, used as ground truth when
/// scoring predictions.
#[derive(Debug, Clone, Default)]
pub struct RuntimeTable {
    outcomes: HashMap<String, HashMap<Solver, Outcome>>,
}

impl RuntimeTable {
    /// Decodes the observed outcome of every record.
    pub fn from_records(records: &[RuntimeRecord], timeout: f64) -> Result<Self> {
        let mut outcomes: HashMap<String, HashMap<Solver, Outcome>> =
            HashMap::new();
        for record in records {
            outcomes
                .entry(record.instance.clone())
                .or_default()
                .insert(record.solver.clone(), record.observed_outcome(timeout)?);
        }
        Ok(Self { outcomes })
    }

    /// Number of instances.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether there are no instances.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// All outcomes of `instance`, an error if it has none.
    pub fn outcomes(&self, instance: &str) -> Result<&HashMap<Solver, Outcome>> {
        self.outcomes
            .get(instance)
            .with_context(|| format!("no runtimes recorded for instance {instance}"))
    }

    /// Outcome of `solver` on `instance`, an error if it never ran.
    pub fn outcome(&self, instance: &str, solver: &str) -> Result<&Outcome> {
        self.outcomes(instance)?.get(solver).with_context(|| {
            format!("no runtime recorded for solver {solver} on instance {instance}")
        })
    }

    /// Runtime of the virtual best solver, `None` if no solver succeeded.
    pub fn best_time(&self, instance: &str) -> Result<Option<f64>> {
        Ok(self
            .outcomes(instance)?
            .values()
            .filter(|outcome| outcome.is_ok())
            .map(|outcome| outcome.time)
            .min_by(f64::total_cmp))
    }
}

#[cfg(test)]
mod tests;
