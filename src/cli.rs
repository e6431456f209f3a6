use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::Verbosity;

use crate::{cross_validation::EvaluationSettings, datastructures::*};

/// Command line arguments of `sunny`.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
    /// Log level
    #[command(flatten)]
    pub verbosity: Verbosity,
}

/// The phases of a SUNNY run.
#[derive(Subcommand)]
pub enum Command {
    /// Build a knowledge base from a scenario directory
    Train {
        /// Path to the scenario directory
        scenario: PathBuf,
        /// Range of the normalized features
        #[arg(long, value_name = "LB,UB", default_value = "-1,1", allow_hyphen_values = true)]
        feat_range: FeatureRange,
        /// Value of missing features after normalization
        #[arg(long, value_name = "V", default_value_t = -1.0, allow_hyphen_values = true)]
        feat_def: f64,
        /// Drop instances no solver can solve
        #[arg(long)]
        discard: bool,
        /// Directory the knowledge base is written to
        #[arg(long, value_name = "DIR", default_value = ".")]
        kb_path: PathBuf,
        /// File name of the knowledge base (without extension)
        #[arg(long, value_name = "NAME")]
        kb_name: Option<String>,
    },
    /// Predict a schedule for every instance of a scenario directory
    Test {
        /// Path to the scenario directory
        scenario: PathBuf,
        /// Path to the knowledge base
        #[arg(short = 'K', long, value_name = "FILE")]
        kb: PathBuf,
        /// Static schedule run before the dynamic one
        #[arg(short, long, value_name = "s1,t1,...")]
        static_schedule: Option<Schedule>,
        /// Neighborhood size
        #[arg(short)]
        k: Option<usize>,
        /// Restrict the portfolio
        #[arg(short = 'P', long, value_name = "s1,...", value_delimiter = ',')]
        portfolio: Option<Vec<Solver>>,
        /// Backup solver
        #[arg(short, long)]
        backup: Option<Solver>,
        /// Timeout in seconds
        #[arg(short = 'T', long)]
        timeout: Option<f64>,
        /// Write predictions to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Also print the static schedule before the SUNNY schedule
        #[arg(long)]
        print_static: bool,
    },
    /// Score a prediction file against the runs of a scenario
    Score {
        /// Path to the scenario directory
        scenario: PathBuf,
        /// Path to the prediction file
        predictions: PathBuf,
        /// Timeout in seconds, defaults to the scenario cutoff
        #[arg(short = 'T', long)]
        timeout: Option<f64>,
    },
    /// Cross-validate on one or more scenario directories
    Evaluate {
        /// Paths to the scenario directories
        #[arg(required = true)]
        scenarios: Vec<PathBuf>,
        /// Number of cross-validation folds
        #[arg(long, default_value_t = 10)]
        folds: usize,
        /// Seed of the fold split
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Keep unsolvable instances in the knowledge bases
        #[arg(long)]
        no_discard: bool,
        /// Write the summaries as JSON
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

impl Command {
    /// Query overrides given on the command line of `test`.
    pub fn to_overrides(&self) -> QueryOverrides {
        match self {
            Command::Test {
                static_schedule,
                k,
                portfolio,
                backup,
                timeout,
                ..
            } => QueryOverrides {
                k: *k,
                portfolio: portfolio.clone(),
                backup: backup.clone(),
                timeout: *timeout,
                static_schedule: static_schedule.clone(),
            },
            _ => QueryOverrides::default(),
        }
    }

    /// Training settings given on the command line of `train`.
    pub fn to_train_config(&self) -> TrainConfig {
        match self {
            Command::Train {
                feat_range,
                feat_def,
                discard,
                ..
            } => TrainConfig {
                range: *feat_range,
                feat_default: *feat_def,
                discard_unsolved: *discard,
            },
            _ => TrainConfig::default(),
        }
    }

    /// Cross-validation settings given on the command line of `evaluate`.
    pub fn to_evaluation_settings(&self) -> EvaluationSettings {
        let defaults = EvaluationSettings::default();
        match self {
            Command::Evaluate {
                folds,
                seed,
                no_discard,
                ..
            } => EvaluationSettings {
                num_folds: *folds,
                seed: *seed,
                train_config: TrainConfig {
                    discard_unsolved: !no_discard,
                    ..defaults.train_config
                },
            },
            _ => defaults,
        }
    }
}

/// `<kb_path>/<kb_name>.json`, the name defaulting to `kb_<scenario dir>`.
pub fn knowledge_base_file(
    scenario: &Path,
    kb_path: &Path,
    kb_name: Option<&str>,
) -> Result<PathBuf> {
    let name = match kb_name {
        Some(name) => name.to_string(),
        None => {
            let dir = scenario
                .canonicalize()
                .unwrap_or_else(|_| scenario.to_path_buf());
            let dir_name = dir
                .file_name()
                .with_context(|| format!("cannot name a knowledge base after {}", scenario.display()))?;
            format!("kb_{}", dir_name.to_string_lossy())
        }
    };
    Ok(kb_path.join(format!("{name}.json")))
}
