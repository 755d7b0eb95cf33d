//! Posterior draw storage.
//!
//! A [`PosteriorDrawSet`] holds, for one fitted model, an ordered draw
//! sequence per parameter (one value per retained sampler iteration across
//! all chains). Draw order is the sampler's empirical posterior and is never
//! re-sorted here; consumers sort copies for quantile computation only.

use crate::{Error, Result};

/// Per-parameter posterior draws for one fitted model.
#[derive(Debug, Clone)]
pub struct PosteriorDrawSet {
    names: Vec<String>,
    draws: Vec<Vec<f64>>,
    n_draws: usize,
    converged: bool,
    warnings: Vec<String>,
}

impl PosteriorDrawSet {
    /// Build a draw set from `(parameter, draws)` pairs.
    ///
    /// Every draw sequence must have the same non-zero length and parameter
    /// names must be unique; violations fail fast.
    pub fn new(params: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let n_draws = match params.first() {
            Some((_, d)) => d.len(),
            None => return Err(Error::Validation("draw set has no parameters".to_string())),
        };
        if n_draws == 0 {
            return Err(Error::Validation(format!(
                "parameter '{}' has an empty draw sequence",
                params[0].0
            )));
        }

        let mut names = Vec::with_capacity(params.len());
        let mut draws = Vec::with_capacity(params.len());
        for (name, d) in params {
            if names.contains(&name) {
                return Err(Error::Validation(format!("duplicate parameter '{}'", name)));
            }
            if d.len() != n_draws {
                return Err(Error::Validation(format!(
                    "parameter '{}' has {} draws, expected {} (ragged draw set)",
                    name,
                    d.len(),
                    n_draws
                )));
            }
            names.push(name);
            draws.push(d);
        }

        Ok(Self { names, draws, n_draws, converged: true, warnings: Vec::new() })
    }

    /// Number of retained draws per parameter.
    pub fn n_draws(&self) -> usize {
        self.n_draws
    }

    /// Parameter names in storage order.
    pub fn parameter_names(&self) -> &[String] {
        &self.names
    }

    /// Draws for one parameter, if present.
    pub fn draws_for(&self, name: &str) -> Option<&[f64]> {
        self.names.iter().position(|n| n == name).map(|i| self.draws[i].as_slice())
    }

    /// Draws for one parameter; missing parameters are a contract violation.
    pub fn require_draws(&self, name: &str) -> Result<&[f64]> {
        self.draws_for(name).ok_or_else(|| {
            Error::Validation(format!(
                "parameter '{}' not found in draw set (have: {})",
                name,
                self.names.join(", ")
            ))
        })
    }

    /// Iterate `(name, draws)` in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names.iter().map(String::as_str).zip(self.draws.iter().map(Vec::as_slice))
    }

    /// Record a sampler non-convergence signal.
    ///
    /// Summaries may still be computed from a flagged draw set; downstream
    /// consumers check [`PosteriorDrawSet::converged`] before trusting them.
    pub fn mark_nonconverged(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("sampler reported non-convergence: {}", reason);
        self.converged = false;
        self.warnings.push(reason);
    }

    /// Whether the sampling backend reported convergence.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Warnings attached by the sampling backend.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
