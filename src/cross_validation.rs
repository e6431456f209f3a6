use std::collections::HashSet;

use anyhow::{ensure, Context, Result};
use itertools::Itertools;
use log::info;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::{
    csv_parser::{RuntimeTable, Scenario},
    datastructures::*,
    knowledge_base::KnowledgeBase,
    predictor::Predictor,
    scorer::{score_fold, FoldStatistics},
};

/// Training and test instances of one fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// Instances the knowledge base is built from.
    pub train: HashSet<String>,
    /// Instances predicted and scored.
    pub test: HashSet<String>,
}

/// Settings of a cross-validation run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct EvaluationSettings {
    /// Number of folds, at least 2.
    pub num_folds: usize,
    /// Seed of the instance shuffle.
    pub seed: u64,
    /// Used for the knowledge base of every fold.
    pub train_config: TrainConfig,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            num_folds: 10,
            seed: 42,
            train_config: TrainConfig {
                discard_unsolved: true,
                ..TrainConfig::default()
            },
        }
    }
}

/// Shuffles the instances and deals them round-robin into `num_folds` test
/// sets. The training set of a fold is every other instance.
pub fn split_folds(
    instances: &[String],
    num_folds: usize,
    seed: u64,
) -> Result<Vec<Fold>> {
    ensure!(
        (2..=instances.len()).contains(&num_folds),
        "cannot split {} instances into {num_folds} folds",
        instances.len()
    );
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut shuffled = instances.to_vec();
    shuffled.shuffle(&mut rng);
    Ok((0..num_folds)
        .map(|fold| {
            let (test, train): (Vec<_>, Vec<_>) = shuffled
                .iter()
                .enumerate()
                .partition(|(position, _)| position % num_folds == fold);
            Fold {
                train: train.into_iter().map(|(_, i)| i.clone()).collect(),
                test: test.into_iter().map(|(_, i)| i.clone()).collect(),
            }
        })
        .collect_vec())
}

/// Cross-validates SUNNY on a scenario: one knowledge base per training set,
/// every test instance predicted and scored against its recorded runs.
pub fn evaluate(
    scenario: &Scenario,
    settings: &EvaluationSettings,
) -> Result<FoldStatistics> {
    let timeout = scenario.timeout();
    let folds = split_folds(scenario.instances(), settings.num_folds, settings.seed)?;
    let mut total = FoldStatistics::default();
    for (fold_idx, fold) in folds.iter().enumerate() {
        let kb = KnowledgeBase::build(&scenario.restrict(&fold.train), &settings.train_config)
            .with_context(|| format!("failed to train fold {fold_idx}"))?;
        let predictor = Predictor::new(&kb, QueryOverrides::default())?;
        let test = scenario.restrict(&fold.test);
        let predictions = test
            .features
            .iter()
            .map(|(instance, raw)| {
                let schedule =
                    predictor.predict(&raw.to_vec(), test.feature_cost(instance))?;
                Ok(Prediction::new(instance.clone(), schedule))
            })
            .collect::<Result<Vec<_>>>()?;
        let ground_truth = RuntimeTable::from_records(&test.runs, timeout)?;
        let stats = score_fold(&predictions, &ground_truth, timeout, &test.feature_costs)?;
        info!(
            "Fold {}/{}: {} of {} instances solved",
            fold_idx + 1,
            folds.len(),
            stats.solved,
            stats.n
        );
        total += stats;
    }
    Ok(total)
}
