//! Condition contrasts on paired posterior draws.
//!
//! Given two draw sequences for a logically equivalent parameter under two
//! conditions, the contrast is the elementwise after-minus-before
//! difference distribution. Pairing is positional (by sampling index), so
//! both fits must use identical sampler configuration; unequal lengths are
//! a contract violation.

use serde::Serialize;

use bf_core::{Error, PosteriorDrawSet, Result};

use crate::stats::{central_interval, mean, sorted_copy};

/// Summary of a difference-of-draws distribution.
#[derive(Debug, Clone, Serialize)]
pub struct ContrastSummary {
    /// Comparison label (e.g. `after_vs_before`).
    pub comparison: String,
    /// Mean difference.
    pub estimate: f64,
    /// 2.5th percentile of the difference sequence.
    pub ci_95_lower: f64,
    /// 97.5th percentile of the difference sequence.
    pub ci_95_upper: f64,
    /// Fraction of differences strictly greater than zero.
    pub prob_positive: f64,
}

/// Contrast two named draw sequences (after minus before).
pub fn condition_contrast(label: &str, after: &[f64], before: &[f64]) -> Result<ContrastSummary> {
    if after.is_empty() {
        return Err(Error::Validation(format!(
            "contrast '{}' has empty draw sequences",
            label
        )));
    }
    if after.len() != before.len() {
        return Err(Error::Validation(format!(
            "contrast '{}' requires equal draw counts (pairing is positional), got {} and {}",
            label,
            after.len(),
            before.len()
        )));
    }

    let diff: Vec<f64> = after.iter().zip(before).map(|(&a, &b)| a - b).collect();
    let sorted = sorted_copy(&diff);
    let (ci_95_lower, ci_95_upper) = central_interval(&sorted, 0.95);
    let n_pos = diff.iter().filter(|&&d| d > 0.0).count();

    Ok(ContrastSummary {
        comparison: label.to_string(),
        estimate: mean(&diff),
        ci_95_lower,
        ci_95_upper,
        prob_positive: n_pos as f64 / diff.len() as f64,
    })
}

/// Contrast the same parameter across two fitted draw sets.
pub fn contrast_parameter(
    label: &str,
    parameter: &str,
    after: &PosteriorDrawSet,
    before: &PosteriorDrawSet,
) -> Result<ContrastSummary> {
    condition_contrast(label, after.require_draws(parameter)?, before.require_draws(parameter)?)
}
