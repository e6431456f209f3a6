use std::{
    collections::HashMap,
    fs,
    io::BufReader,
    path::Path,
};

use anyhow::{ensure, Context, Result};
use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    csv_parser::Scenario,
    datastructures::*,
    normalizer::{normalize, FeatureLimits},
};

/// A training instance: its normalized features and the outcome of every
/// portfolio solver.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct KnowledgeBaseEntry {
    /// Instance name.
    pub instance: String,
    /// Normalized values of the selected features.
    pub features: Vec<f64>,
    /// Outcome of every portfolio solver, failures charged at the timeout.
    pub outcomes: HashMap<Solver, Outcome>,
}

impl KnowledgeBaseEntry {
    /// Recorded time of `solver`, or `timeout` if it never ran on this
    /// instance.
    pub fn time(&self, solver: &str, timeout: f64) -> f64 {
        self.outcomes
            .get(solver)
            .map_or(timeout, |outcome| outcome.time)
    }

    /// Whether some solver solved this instance.
    pub fn is_solvable(&self) -> bool {
        self.outcomes.values().any(Outcome::is_ok)
    }
}

/// Everything needed to answer queries against a knowledge base.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct KnowledgeBaseConfig {
    /// Lower bound of the normalized features.
    pub lb: f64,
    /// Upper bound of the normalized features.
    pub ub: f64,
    /// Normalized value of missing features.
    pub feat_default: f64,
    /// Backup solver over the whole training set.
    pub backup: Solver,
    /// Cutoff time of the training scenario.
    pub timeout: f64,
    /// Solvers of the training scenario.
    pub portfolio: Vec<Solver>,
    /// Default `k`, the rounded square root of the number of training instances.
    pub neighborhood_size: usize,
    /// Schedule run before the SUNNY schedule, empty after training.
    #[serde(default)]
    pub static_schedule: Schedule,
    /// Indices of the non-constant features.
    pub selected_features: Vec<usize>,
}

/// Training instances ready for neighbor queries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct KnowledgeBase {
    /// Query defaults.
    pub config: KnowledgeBaseConfig,
    /// Limits used to normalize queries.
    pub limits: FeatureLimits,
    /// Training instances, in scenario order.
    pub entries: Vec<KnowledgeBaseEntry>,
}

#[derive(Debug, Clone, Copy, Default)]
struct SolverRecord {
    solved: usize,
    time: f64,
}

impl SolverRecord {
    fn add(&mut self, solved: bool, time: f64) {
        if solved {
            self.solved += 1;
        }
        self.time += time;
    }
}

/// Solved count and cumulative time per solver, the basis of the backup
/// solver choice.
#[derive(Debug, Clone)]
struct PortfolioStats {
    records: HashMap<Solver, SolverRecord>,
}

impl PortfolioStats {
    fn new(portfolio: &[Solver]) -> Self {
        Self {
            records: portfolio
                .iter()
                .map(|solver| (solver.clone(), SolverRecord::default()))
                .collect(),
        }
    }

    fn add(&mut self, solver: &str, solved: bool, time: f64) -> Result<()> {
        self.records
            .get_mut(solver)
            .with_context(|| format!("solver {solver} is not in the portfolio"))?
            .add(solved, time);
        Ok(())
    }

    /// Most instances solved, then least cumulative time, then name.
    fn best(&self) -> Option<Solver> {
        self.records
            .iter()
            .min_by(|(name_a, a), (name_b, b)| {
                b.solved
                    .cmp(&a.solved)
                    .then_with(|| a.time.total_cmp(&b.time))
                    .then_with(|| name_a.cmp(name_b))
            })
            .map(|(name, _)| name.clone())
    }
}

impl KnowledgeBase {
    /// Builds the knowledge base of a training scenario.
    ///
    /// Every run counts towards the backup solver, including runs on
    /// instances dropped by `discard_unsolved`. A solver without a run on an
    /// instance is charged as a failure at the timeout.
    pub fn build(scenario: &Scenario, train_config: &TrainConfig) -> Result<Self> {
        let portfolio = scenario.portfolio();
        let timeout = scenario.timeout();
        let FeatureRange { lb, ub } = train_config.range;
        ensure!(!portfolio.is_empty(), "the portfolio is empty");
        ensure!(
            portfolio.iter().all_unique(),
            "the portfolio contains duplicate solvers"
        );
        ensure!(lb < ub, "empty feature range [{lb}, {ub}]");

        let mut stats = PortfolioStats::new(portfolio);
        let mut outcomes: HashMap<&str, HashMap<Solver, Outcome>> =
            HashMap::new();
        for run in &scenario.runs {
            let outcome = run.charged_outcome(timeout)?;
            stats.add(&run.solver, outcome.is_ok(), outcome.time)?;
            outcomes
                .entry(run.instance.as_str())
                .or_default()
                .insert(run.solver.clone(), outcome);
        }

        let limits = FeatureLimits::from_features(&scenario.features.values);
        let mut entries = Vec::with_capacity(scenario.features.len());
        for (instance, raw) in scenario.features.iter() {
            let mut instance_outcomes = outcomes
                .get(instance.as_str())
                .with_context(|| format!("no runtimes recorded for instance {instance}"))?
                .clone();
            for solver in portfolio {
                if !instance_outcomes.contains_key(solver) {
                    warn!("No run of {solver} on {instance}, assuming a timeout");
                    stats.add(solver, false, timeout)?;
                    instance_outcomes
                        .insert(solver.clone(), Outcome::new(RunStatus::Other, timeout));
                }
            }
            let entry = KnowledgeBaseEntry {
                instance: instance.clone(),
                features: normalize(
                    &raw.to_vec(),
                    &limits,
                    lb,
                    ub,
                    train_config.feat_default,
                )
                .with_context(|| format!("malformed feature vector of {instance}"))?,
                outcomes: instance_outcomes,
            };
            if train_config.discard_unsolved && !entry.is_solvable() {
                continue;
            }
            entries.push(entry);
        }

        let backup = stats.best().context("no backup solver available")?;

        let num_instances = scenario.features.len();
        let config = KnowledgeBaseConfig {
            lb,
            ub,
            feat_default: train_config.feat_default,
            backup,
            timeout,
            portfolio: portfolio.to_vec(),
            neighborhood_size: (num_instances as f64).sqrt().round() as usize,
            static_schedule: Schedule::default(),
            selected_features: limits.selected_features(),
        };
        info!(
            "Built knowledge base with {} of {} instances, {} selected features, backup solver {}",
            entries.len(),
            num_instances,
            config.selected_features.len(),
            config.backup
        );
        Ok(Self {
            config,
            limits,
            entries,
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The backup solver over all entries, restricted to `portfolio`, with
    /// failures charged at `timeout`.
    pub fn backup_solver(&self, portfolio: &[Solver], timeout: f64) -> Option<Solver> {
        let mut stats = PortfolioStats::new(portfolio);
        for entry in &self.entries {
            for (solver, outcome) in &entry.outcomes {
                // solvers outside the query portfolio are not candidates
                if let Some(record) = stats.records.get_mut(solver) {
                    let time = if outcome.is_ok() { outcome.time } else { timeout };
                    record.add(outcome.is_ok(), time);
                }
            }
        }
        stats.best()
    }

    /// Writes the knowledge base as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        serde_json::to_writer_pretty(
            fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
            self,
        )?;
        Ok(())
    }

    /// Reads a knowledge base written by [`KnowledgeBase::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let file = fs::File::open(path).with_context(|| {
            format!("knowledge base {} does not exist", path.display())
        })?;
        let kb: KnowledgeBase = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("malformed knowledge base {}", path.display()))?;
        Ok(kb)
    }
}
