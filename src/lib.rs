#![warn(missing_docs)]
//! SUNNY algorithm selection for ASlib scenarios.
//!
//! A knowledge base of training instances (normalized features plus the
//! outcome of every solver) is built from a scenario. For a new instance the
//! `k` nearest training instances are looked up and a time-sliced schedule of
//! solvers is derived from what solved them. Predicted schedules are scored
//! with PAR10 and the fraction of solved instances, either from prediction
//! files or by cross-validation.
//!
//! The `sunny` executable wraps these steps in the `train`, `test`, `score`
//! and `evaluate` subcommands, `data_generator` writes synthetic scenarios.
//!
//! Example
//! ```rust
//! use sunny_as::csv_parser::Scenario;
//! use sunny_as::datastructures::{QueryOverrides, TrainConfig};
//! use sunny_as::knowledge_base::KnowledgeBase;
//! use sunny_as::predictor::Predictor;
//! # use std::path::PathBuf;
//! # use anyhow::Result;
//!
//! fn example() -> Result<()> {
//!     // description.json, algorithm_runs.csv, feature_values.csv and
//!     // optionally feature_costs.csv
//!     let scenario = Scenario::from_dir(&PathBuf::from("my_scenario"))?;
//!     let kb = KnowledgeBase::build(&scenario, &TrainConfig::default())?;
//!
//!     // overrides default to the knowledge base configuration
//!     let predictor = Predictor::new(&kb, QueryOverrides::default())?;
//!     let features = [0.0, 10.0, 5.0];
//!     let feature_cost = 1.0;
//!     let schedule = predictor.predict(&features, feature_cost)?;
//!     println!("{}", schedule);
//!     Ok(())
//! }
//! ```

/// Command line interface of the `sunny` executable.
pub mod cli;

/// Enumeration of k-combinations in the combinatorial number system.
pub mod combinations;

/// Seeded fold splitting and the train, predict, score pipeline.
pub mod cross_validation;

/// Reading and writing of scenario directories and prediction files.
pub mod csv_parser;

/// Shared data structures: runs, outcomes, schedules and configurations.
pub mod datastructures;

/// Training instances with normalized features and solver outcomes.
pub mod knowledge_base;

/// Nearest neighbor search over a knowledge base.
pub mod neighbors;

/// Min-max scaling of feature vectors.
pub mod normalizer;

/// Schedule queries against a knowledge base.
pub mod predictor;

/// Sub-portfolio selection and time slicing.
pub mod scheduler;

/// PAR10 and FSI scoring of predicted schedules.
pub mod scorer;

#[cfg(test)]
mod test_utils;
