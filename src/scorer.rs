use std::{collections::HashMap, ops::AddAssign};

use anyhow::{ensure, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{csv_parser::RuntimeTable, datastructures::*};

/// PAR10 and FSI accumulators of one or more folds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct FoldStatistics {
    /// Instances scored.
    pub n: usize,
    /// Instances solved by at least one solver.
    pub m: usize,
    /// Instances the predicted schedule solves.
    pub solved: usize,
    /// Instances charged 10 x timeout.
    pub penalized: usize,
    /// Sum of the PAR10 scores of all instances.
    pub par10: f64,
    /// Sum of the virtual best solver scores.
    pub par10_vbs: f64,
}

impl AddAssign for FoldStatistics {
    fn add_assign(&mut self, other: Self) {
        self.n += other.n;
        self.m += other.m;
        self.solved += other.solved;
        self.penalized += other.penalized;
        self.par10 += other.par10;
        self.par10_vbs += other.par10_vbs;
    }
}

impl FoldStatistics {
    /// Averages over all scored instances.
    pub fn summary(&self) -> Result<ScenarioSummary> {
        ensure!(self.n > 0, "no instance was scored");
        let n = self.n as f64;
        Ok(ScenarioSummary {
            n: self.n,
            m: self.m,
            fsi: self.solved as f64 / n,
            fsi_vbs: self.m as f64 / n,
            par10: self.par10 / n,
            par10_vbs: self.par10_vbs / n,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Replay {
    Accumulating { consumed: f64 },
    Solved { runtime: f64 },
    Penalized,
}

/// Runs `schedule` against the recorded outcomes of `instance`.
fn replay(
    instance: &str,
    schedule: &Schedule,
    ground_truth: &RuntimeTable,
    timeout: f64,
    feature_cost: f64,
) -> Result<Replay> {
    let mut state = Replay::Accumulating {
        consumed: feature_cost,
    };
    for (solver, slice) in &schedule.steps {
        let Replay::Accumulating { consumed } = state else {
            break;
        };
        let outcome = ground_truth.outcome(instance, solver)?;
        state = if outcome.is_ok() && outcome.time <= *slice {
            if consumed + outcome.time >= timeout {
                Replay::Penalized
            } else {
                Replay::Solved {
                    runtime: consumed + outcome.time,
                }
            }
        } else {
            let spent = slice.min(outcome.time);
            if consumed + spent < timeout {
                Replay::Accumulating {
                    consumed: consumed + spent,
                }
            } else {
                Replay::Penalized
            }
        };
    }
    Ok(match state {
        Replay::Accumulating { .. } => Replay::Penalized,
        terminal => terminal,
    })
}

/// Scores the predictions of one fold. Every prediction counts as one
/// instance, an empty schedule is an unsolved instance.
pub fn score_fold(
    predictions: &[Prediction],
    ground_truth: &RuntimeTable,
    timeout: f64,
    feature_costs: &HashMap<String, f64>,
) -> Result<FoldStatistics> {
    let penalty = 10.0 * timeout;
    let mut stats = FoldStatistics::default();
    for Prediction { instance, schedule } in predictions {
        stats.n += 1;
        match ground_truth.best_time(instance)? {
            Some(best) => {
                stats.m += 1;
                stats.par10_vbs += best;
            }
            None => stats.par10_vbs += penalty,
        }
        let feature_cost = feature_costs.get(instance).copied().unwrap_or(0.0);
        match replay(instance, schedule, ground_truth, timeout, feature_cost)? {
            Replay::Solved { runtime } => {
                debug!("{instance} solved in {runtime}");
                stats.solved += 1;
                stats.par10 += runtime;
            }
            _ => {
                debug!("{instance} not solved");
                stats.penalized += 1;
                stats.par10 += penalty;
            }
        }
    }
    Ok(stats)
}

/// Groups `(instance, solver, time)` rows into predictions. Consecutive rows
/// of the same instance form one schedule.
pub fn group_predictions(
    rows: impl IntoIterator<Item = (String, Solver, f64)>,
) -> Vec<Prediction> {
    let mut predictions: Vec<Prediction> = vec![];
    for (instance, solver, time) in rows {
        match predictions.last_mut() {
            Some(last) if last.instance == instance => {
                last.schedule.steps.push((solver, time))
            }
            _ => predictions.push(Prediction::new(
                instance,
                Schedule::new(vec![(solver, time)]),
            )),
        }
    }
    predictions
}
