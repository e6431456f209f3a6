use std::collections::HashSet;

use itertools::Itertools;
use log::debug;

use crate::{
    combinations::Combinations, datastructures::*,
    knowledge_base::KnowledgeBaseEntry,
};

/// Neighbors solved and total time spent per portfolio solver.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborhoodStats {
    /// Per solver, the neighbors it solves within the timeout.
    pub solved: Vec<HashSet<usize>>,
    /// Per solver, total time over the neighborhood.
    pub times: Vec<f64>,
}

impl NeighborhoodStats {
    /// Statistics of `portfolio` on `neighborhood`.
    pub fn new(
        neighborhood: &[&KnowledgeBaseEntry],
        portfolio: &[Solver],
        timeout: f64,
    ) -> Self {
        let (solved, times): (Vec<HashSet<usize>>, Vec<f64>) = portfolio
            .iter()
            .map(|solver| {
                let times = neighborhood
                    .iter()
                    .map(|entry| entry.time(solver, timeout))
                    .collect_vec();
                let solved = times
                    .iter()
                    .positions(|&time| time < timeout)
                    .collect::<HashSet<_>>();
                (solved, times.iter().sum::<f64>())
            })
            .unzip();
        Self { solved, times }
    }
}

/// A subset of the portfolio with its neighborhood performance.
#[derive(Debug, Clone, PartialEq)]
pub struct SubPortfolio {
    /// Indices into the portfolio.
    pub solvers: Vec<usize>,
    /// Neighbors solved by at least one member.
    pub num_solved: usize,
    /// Total neighborhood time of the members.
    pub solving_time: f64,
}

/// Searches the sub-portfolio solving the most neighbors, preferring less
/// total time on ties.
///
/// Sizes are tried in increasing order and the search stops at the first
/// size that does not improve on the best sub-portfolio found so far.
pub fn best_sub_portfolio(stats: &NeighborhoodStats) -> SubPortfolio {
    let m = stats.solved.len();
    let mut best = SubPortfolio {
        solvers: vec![],
        num_solved: 0,
        solving_time: f64::INFINITY,
    };
    for size in 1..=m {
        let previous = best.solvers.clone();
        for subset in Combinations::new(m, size) {
            let num_solved = subset
                .iter()
                .flat_map(|&s| stats.solved[s].iter())
                .unique()
                .count();
            let solving_time = subset.iter().map(|&s| stats.times[s]).sum::<f64>();
            if num_solved > best.num_solved
                || (num_solved == best.num_solved
                    && solving_time < best.solving_time)
            {
                best = SubPortfolio {
                    solvers: subset,
                    num_solved,
                    solving_time,
                };
            }
        }
        if best.solvers == previous {
            break;
        }
    }
    best
}

/// Computes the SUNNY schedule of a neighborhood.
///
/// Every solver of the best sub-portfolio gets a share of `timeout`
/// proportional to the neighbors it solves, the remaining time goes to
/// `backup`. Solvers are ordered by their total time on the neighborhood.
pub fn sunny_schedule(
    neighborhood: &[&KnowledgeBaseEntry],
    timeout: f64,
    portfolio: &[Solver],
    k: usize,
    backup: &Solver,
) -> Schedule {
    if neighborhood.is_empty() || timeout <= 0.0 || portfolio.is_empty() {
        return Schedule::default();
    }
    let stats = NeighborhoodStats::new(neighborhood, portfolio, timeout);
    let best = best_sub_portfolio(&stats);
    debug!(
        "Best sub-portfolio {:?} solves {} of {} neighbors",
        best.solvers.iter().map(|&s| &portfolio[s]).collect_vec(),
        best.num_solved,
        neighborhood.len()
    );

    // every solved neighbor counted once per solver, unsolved ones once
    let n = best
        .solvers
        .iter()
        .map(|&s| stats.solved[s].len())
        .sum::<usize>()
        + k.saturating_sub(best.num_solved);
    let mut steps = best
        .solvers
        .iter()
        .filter_map(|&s| {
            let ns = stats.solved[s].len();
            let slot = timeout / n as f64 * ns as f64;
            (ns > 0 && slot.round() != 0.0).then(|| (portfolio[s].clone(), slot))
        })
        .collect_vec();

    let total = steps.iter().map(|(_, time)| time).sum::<f64>();
    if total.round() < timeout {
        let remaining = timeout - total;
        match steps.iter_mut().find(|(solver, _)| solver == backup) {
            Some((_, time)) => *time += remaining,
            None => steps.push((backup.clone(), remaining)),
        }
    }

    let neighborhood_time = |solver: &Solver| -> f64 {
        match portfolio.iter().position(|s| s == solver) {
            Some(s) => stats.times[s],
            None => neighborhood
                .iter()
                .map(|entry| entry.time(solver, timeout))
                .sum(),
        }
    };
    steps.sort_by(|(a, _), (b, _)| {
        neighborhood_time(a).total_cmp(&neighborhood_time(b))
    });
    Schedule::new(steps)
}
