//! Posterior summarization: point estimates and nested credible intervals.
//!
//! For each parameter's draw sequence this computes the draw mean and sample
//! standard deviation as estimate/error, plus 50%, 80%, and 95% central
//! credible intervals from linearly interpolated empirical quantiles
//! (25/75, 10/90, and 2.5/97.5 percentiles).

use serde::Serialize;

use bf_core::{Error, PosteriorDrawSet, Result};

use crate::stats::{central_interval, mean, sample_sd, sorted_copy};

/// Point estimate plus nested credible intervals for one parameter.
///
/// Field names follow the output table schema.
#[derive(Debug, Clone, Serialize)]
pub struct CredibleSummary {
    /// Parameter name.
    pub parameter: String,
    /// Draw mean.
    pub estimate: f64,
    /// Draw sample standard deviation.
    pub error: f64,
    /// 50% interval lower bound (25th percentile).
    pub ci_50_lower: f64,
    /// 50% interval upper bound (75th percentile).
    pub ci_50_upper: f64,
    /// 80% interval lower bound (10th percentile).
    pub ci_80_lower: f64,
    /// 80% interval upper bound (90th percentile).
    pub ci_80_upper: f64,
    /// 95% interval lower bound (2.5th percentile).
    pub ci_95_lower: f64,
    /// 95% interval upper bound (97.5th percentile).
    pub ci_95_upper: f64,
}

/// Summarize one named draw sequence.
///
/// An empty sequence is a programming-contract violation and fails fast.
pub fn summarize_sequence(parameter: &str, draws: &[f64]) -> Result<CredibleSummary> {
    if draws.is_empty() {
        return Err(Error::Validation(format!(
            "parameter '{}' has an empty draw sequence",
            parameter
        )));
    }
    let sorted = sorted_copy(draws);
    let (ci_50_lower, ci_50_upper) = central_interval(&sorted, 0.50);
    let (ci_80_lower, ci_80_upper) = central_interval(&sorted, 0.80);
    let (ci_95_lower, ci_95_upper) = central_interval(&sorted, 0.95);
    Ok(CredibleSummary {
        parameter: parameter.to_string(),
        estimate: mean(draws),
        error: sample_sd(draws),
        ci_50_lower,
        ci_50_upper,
        ci_80_lower,
        ci_80_upper,
        ci_95_lower,
        ci_95_upper,
    })
}

/// Summarize every parameter of a draw set, in storage order.
pub fn summarize(draws: &PosteriorDrawSet) -> Result<Vec<CredibleSummary>> {
    if !draws.converged() {
        log::warn!(
            "summarizing a draw set flagged as non-converged ({})",
            draws.warnings().join("; ")
        );
    }
    draws.iter().map(|(name, d)| summarize_sequence(name, d)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascending_sequence_summary() {
        // Evenly spaced ascending draws: mean 3, symmetric intervals.
        let s = summarize_sequence("b_value", &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!((s.estimate - 3.0).abs() < 1e-12);
        assert_eq!(s.ci_50_lower, 2.0);
        assert_eq!(s.ci_50_upper, 4.0);
        // Symmetric around the mean.
        assert!((s.ci_50_lower + s.ci_50_upper - 2.0 * s.estimate).abs() < 1e-12);
        // 50% interval strictly narrower than 95%.
        assert!((s.ci_50_upper - s.ci_50_lower) < (s.ci_95_upper - s.ci_95_lower));
        assert!((s.ci_95_lower - 1.1).abs() < 1e-12);
        assert!((s.ci_95_upper - 4.9).abs() < 1e-12);
    }

    #[test]
    fn test_intervals_nested() {
        use rand::SeedableRng;
        use rand_distr::{Distribution, Normal};
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let normal = Normal::new(0.5, 2.0).unwrap();
        let draws: Vec<f64> = (0..2000).map(|_| normal.sample(&mut rng)).collect();

        let s = summarize_sequence("mu", &draws).unwrap();
        assert!(s.ci_80_lower <= s.ci_50_lower, "50% lower must sit inside 80%");
        assert!(s.ci_50_upper <= s.ci_80_upper, "50% upper must sit inside 80%");
        assert!(s.ci_95_lower <= s.ci_80_lower, "80% lower must sit inside 95%");
        assert!(s.ci_80_upper <= s.ci_95_upper, "80% upper must sit inside 95%");
    }

    #[test]
    fn test_empty_sequence_fails() {
        assert!(summarize_sequence("b_value", &[]).is_err());
    }

    #[test]
    fn test_summarize_whole_draw_set() {
        let ds = PosteriorDrawSet::new(vec![
            ("b_Intercept".to_string(), vec![0.0, 1.0, 2.0]),
            ("sigma".to_string(), vec![1.0, 1.0, 1.0]),
        ])
        .unwrap();
        let rows = summarize(&ds).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].parameter, "b_Intercept");
        assert!((rows[1].estimate - 1.0).abs() < 1e-12);
        assert_eq!(rows[1].error, 0.0);
    }
}
