use anyhow::{bail, ensure, Context, Result};
use log::debug;
use once_cell::sync::OnceCell;

use crate::{
    datastructures::*,
    knowledge_base::KnowledgeBase,
    neighbors::find_neighbors,
    normalizer::normalize,
    scheduler::sunny_schedule,
};

/// Answers schedule queries against a knowledge base.
///
/// The query configuration is fixed at construction: the knowledge base
/// configuration with the given overrides applied.
#[derive(Debug)]
pub struct Predictor<'a> {
    kb: &'a KnowledgeBase,
    k: usize,
    portfolio: Vec<Solver>,
    backup: Option<Solver>,
    timeout: f64,
    static_schedule: Schedule,
    fallback_backup: OnceCell<Option<Solver>>,
}

impl<'a> Predictor<'a> {
    /// Fails on solvers unknown to the knowledge base or a non-positive
    /// timeout.
    pub fn new(kb: &'a KnowledgeBase, overrides: QueryOverrides) -> Result<Self> {
        let config = &kb.config;
        let portfolio = overrides
            .portfolio
            .unwrap_or_else(|| config.portfolio.clone());
        let known = |solver: &str| config.portfolio.iter().any(|s| s == solver);
        if let Some(unknown) = portfolio.iter().find(|solver| !known(solver.as_str())) {
            bail!("unknown solver {unknown} in the portfolio");
        }
        ensure!(!portfolio.is_empty(), "the portfolio is empty");
        if let Some(backup) = &overrides.backup {
            ensure!(known(backup.as_str()), "unknown backup solver {backup}");
        }
        let static_schedule = overrides
            .static_schedule
            .unwrap_or_else(|| config.static_schedule.clone());
        if let Some(unknown) = static_schedule.solvers().find(|solver| !known(solver.as_str())) {
            bail!("unknown solver {unknown} in the static schedule");
        }
        let timeout = overrides.timeout.unwrap_or(config.timeout);
        ensure!(timeout > 0.0, "the timeout must be positive");
        Ok(Self {
            kb,
            k: overrides.k.unwrap_or(config.neighborhood_size),
            portfolio,
            backup: overrides.backup,
            timeout,
            static_schedule,
            fallback_backup: OnceCell::new(),
        })
    }

    /// Time budget per instance.
    pub fn timeout(&self) -> f64 {
        self.timeout
    }

    /// The backup solver used for queries. Unless overridden, the backup over
    /// the whole knowledge base, computed once.
    pub fn backup(&self) -> Result<&Solver> {
        if let Some(backup) = &self.backup {
            return Ok(backup);
        }
        self.fallback_backup
            .get_or_init(|| self.kb.backup_solver(&self.portfolio, self.timeout))
            .as_ref()
            .context("no backup solver available")
    }

    /// The static schedule followed by the SUNNY schedule of an instance with
    /// the given raw features.
    pub fn predict(&self, raw_features: &[f64], feature_cost: f64) -> Result<Schedule> {
        let dynamic = self.predict_dynamic(raw_features, feature_cost)?;
        Ok(self.static_schedule.chain(dynamic))
    }

    /// The SUNNY schedule alone. Feature computation and the static schedule
    /// are still deducted from the time available to it.
    pub fn predict_dynamic(
        &self,
        raw_features: &[f64],
        feature_cost: f64,
    ) -> Result<Schedule> {
        let config = &self.kb.config;
        let query = normalize(
            raw_features,
            &self.kb.limits,
            config.lb,
            config.ub,
            config.feat_default,
        )?;
        let neighbors = find_neighbors(&query, self.kb, self.k)?;
        debug!(
            "Neighbors: {:?}",
            neighbors.iter().map(|entry| &entry.instance).collect::<Vec<_>>()
        );
        let budget = self.timeout - feature_cost - self.static_schedule.total_time();
        if budget <= 0.0 {
            return Ok(Schedule::default());
        }
        Ok(sunny_schedule(
            &neighbors,
            budget,
            &self.portfolio,
            neighbors.len(),
            self.backup()?,
        ))
    }
}

#[cfg(test)]
mod tests;
