use anyhow::{bail, ensure, Context, Result};
use core::fmt;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Name of a solver.
pub type Solver = String;

/// Status of a single solver run, as reported by ASlib runtime tables.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Solved within the cutoff.
    Ok,
    /// Stopped at the cutoff.
    Timeout,
    /// Out of memory.
    Memout,
    /// Terminated abnormally.
    Crash,
    /// Any other or unknown status.
    Other,
}

impl FromStr for RunStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_lowercase().as_str() {
            "ok" => RunStatus::Ok,
            "timeout" => RunStatus::Timeout,
            "memout" => RunStatus::Memout,
            "crash" => RunStatus::Crash,
            _ => RunStatus::Other,
        })
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            RunStatus::Ok => "ok",
            RunStatus::Timeout => "timeout",
            RunStatus::Memout => "memout",
            RunStatus::Crash => "crash",
            RunStatus::Other => "other",
        };
        write!(f, "{status}")
    }
}

/// Typed outcome of a solver on an instance.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    /// How the run ended.
    pub status: RunStatus,
    /// Runtime in seconds.
    pub time: f64,
}

impl Outcome {
    /// Outcome with the given status and runtime.
    pub fn new(status: RunStatus, time: f64) -> Self {
        Self { status, time }
    }

    /// Whether the run solved the instance.
    pub fn is_ok(&self) -> bool {
        self.status == RunStatus::Ok
    }
}

/// One row of a runtime table.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeRecord {
    /// Instance name.
    pub instance: String,
    /// Solver name.
    pub solver: Solver,
    /// How the run ended.
    pub status: RunStatus,
    /// `None` where the table has `?`.
    pub runtime: Option<f64>,
}

impl RuntimeRecord {
    /// A record of `solver` on `instance`.
    pub fn new(
        instance: impl Into<String>,
        solver: impl Into<Solver>,
        status: RunStatus,
        runtime: Option<f64>,
    ) -> Self {
        Self {
            instance: instance.into(),
            solver: solver.into(),
            status,
            runtime,
        }
    }

    fn ok_runtime(&self) -> Result<f64> {
        self.runtime.with_context(|| {
            format!(
                "successful run of {} on {} has no runtime",
                self.solver, self.instance
            )
        })
    }

    /// Outcome as stored in a knowledge base: failures are charged the full
    /// timeout.
    pub fn charged_outcome(&self, timeout: f64) -> Result<Outcome> {
        Ok(match self.status {
            RunStatus::Ok => Outcome::new(RunStatus::Ok, self.ok_runtime()?),
            status => Outcome::new(status, timeout),
        })
    }

    /// Outcome as used for scoring: failures keep their recorded time, capped
    /// at the timeout.
    pub fn observed_outcome(&self, timeout: f64) -> Result<Outcome> {
        Ok(match self.status {
            RunStatus::Ok => Outcome::new(RunStatus::Ok, self.ok_runtime()?),
            status => Outcome::new(
                status,
                self.runtime.map_or(timeout, |t| t.min(timeout)),
            ),
        })
    }
}

/// Ordered solver/time-slice pairs.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    /// Solvers with their time slices, in execution order.
    pub steps: Vec<(Solver, f64)>,
}

impl Schedule {
    /// Schedule running `steps` in order.
    pub fn new(steps: Vec<(Solver, f64)>) -> Self {
        Self { steps }
    }

    /// Whether the schedule has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Sum of all time slices.
    pub fn total_time(&self) -> f64 {
        self.steps.iter().map(|(_, time)| time).sum()
    }

    /// Solvers in execution order.
    pub fn solvers(&self) -> impl Iterator<Item = &Solver> {
        self.steps.iter().map(|(solver, _)| solver)
    }

    /// This schedule followed by `other`.
    pub fn chain(&self, other: Schedule) -> Schedule {
        Schedule {
            steps: [self.steps.clone(), other.steps].concat(),
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (solver, time) in &self.steps {
            writeln!(f, "{}: {}", solver, time)?;
        }
        Ok(())
    }
}

/// Parses `s_1,t_1,...,s_n,t_n`.
impl FromStr for Schedule {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Schedule::default());
        }
        let tokens = s.split(',').map(str::trim).collect_vec();
        ensure!(
            tokens.len() % 2 == 0,
            "schedule must be given as solver,time pairs: {s}"
        );
        let steps = tokens
            .chunks(2)
            .map(|pair| {
                let time: f64 = pair[1]
                    .parse()
                    .with_context(|| format!("invalid time {}", pair[1]))?;
                if time < 0.0 {
                    bail!("negative time {time} for solver {}", pair[0]);
                }
                Ok((pair[0].to_string(), time))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Schedule { steps })
    }
}

/// The predicted schedule of one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Instance name.
    pub instance: String,
    /// Schedule predicted for the instance.
    pub schedule: Schedule,
}

impl Prediction {
    /// Prediction of `schedule` for `instance`.
    pub fn new(instance: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            instance: instance.into(),
            schedule,
        }
    }
}

/// Bounds `lb,ub` of the normalized feature range.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FeatureRange {
    /// Lower bound.
    pub lb: f64,
    /// Upper bound.
    pub ub: f64,
}

impl Default for FeatureRange {
    fn default() -> Self {
        Self { lb: -1.0, ub: 1.0 }
    }
}

impl FromStr for FeatureRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let Some((lb, ub)) = s.split_once(',') else {
            bail!("feature range must be given as LB,UB: {s}");
        };
        let range = FeatureRange {
            lb: lb.trim().parse().context("invalid lower bound")?,
            ub: ub.trim().parse().context("invalid upper bound")?,
        };
        ensure!(range.lb < range.ub, "empty feature range {s}");
        Ok(range)
    }
}

/// Settings of the training phase.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    /// Range of the normalized features.
    pub range: FeatureRange,
    /// Value of missing features.
    pub feat_default: f64,
    /// Keep instances no solver solves out of the knowledge base.
    pub discard_unsolved: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            range: FeatureRange::default(),
            feat_default: -1.0,
            discard_unsolved: false,
        }
    }
}

/// Per-query settings layered on top of a knowledge base configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOverrides {
    /// Neighborhood size.
    pub k: Option<usize>,
    /// Solvers the schedule may use.
    pub portfolio: Option<Vec<Solver>>,
    /// Solver that gets the time left over.
    pub backup: Option<Solver>,
    /// Time budget per instance.
    pub timeout: Option<f64>,
    /// Run before the SUNNY schedule of every instance.
    pub static_schedule: Option<Schedule>,
}

/// Scenario-level metrics of a set of predictions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ScenarioSummary {
    /// Instances scored.
    pub n: usize,
    /// Instances solved by at least one solver.
    pub m: usize,
    /// Fraction of instances solved.
    pub fsi: f64,
    /// Fraction solved by the virtual best solver.
    pub fsi_vbs: f64,
    /// Penalized average runtime, failures count 10 x timeout.
    pub par10: f64,
    /// PAR10 of the virtual best solver.
    pub par10_vbs: f64,
}

impl fmt::Display for ScenarioSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "No. of instances: {} ({} solvable)", self.n, self.m)?;
        writeln!(f, "FSI SUNNY: {}", self.fsi)?;
        writeln!(f, "FSI VBS: {}", self.fsi_vbs)?;
        writeln!(f, "PAR10 SUNNY: {}", self.par10)?;
        write!(f, "PAR10 VBS: {}", self.par10_vbs)
    }
}
