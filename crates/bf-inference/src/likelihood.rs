//! Pointwise predictive density under a fitted posterior.
//!
//! For each data row the log pointwise predictive density is the
//! log-mean-exp over posterior draws of the family's per-draw log density:
//! `lpd_i = log( (1/S) * sum_s p(y_i | theta_s, x_i) )`.
//!
//! Parameter naming follows the fitted-model convention: `b_Intercept`,
//! `b_<predictor>` for population-level coefficients, `sigma` for the
//! gaussian / shifted-lognormal scale, `ndt` for the lognormal shift, and
//! optional `r_<group>[<level>]` per-group intercept offsets. A group level
//! absent from the draw set (a held-out subject never seen in training)
//! contributes no offset.

use bf_core::{Dataset, Error, Family, ModelSpecification, PosteriorDrawSet, Result};
use bf_core::SUBJECT_COLUMN;

use crate::stats::{log1pexp, log_mean_exp};

const HALF_LN_2PI: f64 = 0.918_938_533_204_672_7;

fn positive_draws<'a>(draws: &'a PosteriorDrawSet, name: &str) -> Result<&'a [f64]> {
    let d = draws.require_draws(name)?;
    if let Some(&bad) = d.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
        return Err(Error::Computation(format!(
            "parameter '{}' has a non-positive or non-finite draw ({})",
            name, bad
        )));
    }
    Ok(d)
}

fn nonnegative_draws<'a>(draws: &'a PosteriorDrawSet, name: &str) -> Result<&'a [f64]> {
    let d = draws.require_draws(name)?;
    if let Some(&bad) = d.iter().find(|v| !(v.is_finite() && **v >= 0.0)) {
        return Err(Error::Computation(format!(
            "parameter '{}' has a negative or non-finite draw ({})",
            name, bad
        )));
    }
    Ok(d)
}

/// Family-specific density strategy with its scale/shift draws resolved.
enum FamilyEval<'a> {
    Gaussian { sigma: &'a [f64] },
    Bernoulli,
    ShiftedLognormal { sigma: &'a [f64], ndt: &'a [f64] },
}

impl<'a> FamilyEval<'a> {
    fn new(family: Family, draws: &'a PosteriorDrawSet) -> Result<Self> {
        Ok(match family {
            Family::Gaussian => FamilyEval::Gaussian { sigma: positive_draws(draws, "sigma")? },
            Family::Bernoulli => FamilyEval::Bernoulli,
            Family::ShiftedLognormal => FamilyEval::ShiftedLognormal {
                sigma: positive_draws(draws, "sigma")?,
                ndt: nonnegative_draws(draws, "ndt")?,
            },
        })
    }

    /// Log density of outcome `y` given linear predictor `eta` at draw `s`.
    fn ln_density(&self, y: f64, eta: f64, s: usize) -> f64 {
        match self {
            FamilyEval::Gaussian { sigma } => {
                let sd = sigma[s];
                let z = (y - eta) / sd;
                -sd.ln() - 0.5 * z * z - HALF_LN_2PI
            }
            FamilyEval::Bernoulli => {
                if y == 1.0 {
                    -log1pexp(-eta)
                } else {
                    -log1pexp(eta)
                }
            }
            FamilyEval::ShiftedLognormal { sigma, ndt } => {
                let shift = ndt[s];
                if y <= shift {
                    return f64::NEG_INFINITY;
                }
                let sd = sigma[s];
                let ly = (y - shift).ln();
                let z = (ly - eta) / sd;
                -ly - sd.ln() - 0.5 * z * z - HALF_LN_2PI
            }
        }
    }
}

/// Per-group intercept draws aligned to data rows, `None` where the row's
/// level has no matching `r_<group>[<level>]` parameter.
fn group_offsets<'a>(
    group: &str,
    draws: &'a PosteriorDrawSet,
    data: &Dataset,
) -> Result<Vec<Option<&'a [f64]>>> {
    let levels: Vec<Option<String>> = if group == SUBJECT_COLUMN {
        data.subjects().iter().map(|w| Some(w.clone())).collect()
    } else {
        data.categorical(group)?.to_vec()
    };
    Ok(levels
        .iter()
        .map(|level| {
            level
                .as_deref()
                .and_then(|l| draws.draws_for(&format!("r_{}[{}]", group, l)))
        })
        .collect())
}

/// Log pointwise predictive density of every row of `data` under the
/// fitted posterior `draws` for the model `spec`.
///
/// Rows with missing outcome or predictor values are a contract violation;
/// they must be filtered before evaluation.
pub fn pointwise_log_density(
    spec: &ModelSpecification,
    draws: &PosteriorDrawSet,
    data: &Dataset,
) -> Result<Vec<f64>> {
    let formula = spec.formula();
    let y = data.numeric(formula.outcome())?;
    let preds: Vec<&[f64]> = formula
        .predictors()
        .iter()
        .map(|p| data.numeric(p))
        .collect::<Result<_>>()?;

    let n_draws = draws.n_draws();
    let intercept = if formula.intercept() {
        Some(draws.require_draws("b_Intercept")?)
    } else {
        None
    };
    let betas: Vec<&[f64]> = formula
        .predictors()
        .iter()
        .map(|p| draws.require_draws(&format!("b_{}", p)))
        .collect::<Result<_>>()?;

    let family = FamilyEval::new(spec.family(), draws)?;
    let offsets = match formula.random_intercept() {
        Some(group) => Some(group_offsets(group, draws, data)?),
        None => None,
    };

    let mut out = Vec::with_capacity(data.n_rows());
    let mut ll = vec![0.0; n_draws];
    for i in 0..data.n_rows() {
        let yi = y[i];
        if yi.is_nan() || preds.iter().any(|p| p[i].is_nan()) {
            return Err(Error::Validation(format!(
                "row {} has missing values; filter rows before density evaluation",
                i
            )));
        }
        if matches!(family, FamilyEval::Bernoulli) && yi != 0.0 && yi != 1.0 {
            return Err(Error::Validation(format!(
                "bernoulli outcome must be 0 or 1, got {} at row {}",
                yi, i
            )));
        }
        let row_offset = offsets.as_ref().and_then(|o| o[i]);

        for s in 0..n_draws {
            let mut eta = intercept.map_or(0.0, |d| d[s]);
            for (beta, x) in betas.iter().zip(&preds) {
                eta += beta[s] * x[i];
            }
            if let Some(r) = row_offset {
                eta += r[s];
            }
            ll[s] = family.ln_density(yi, eta, s);
        }
        out.push(log_mean_exp(&ll));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_core::{Column, SamplerConfig};

    fn dataset(y: Vec<f64>, x: Vec<f64>) -> Dataset {
        let n = y.len();
        let mut d = Dataset::new((0..n).map(|i| format!("w{}", i)).collect()).unwrap();
        d.add_column("y", Column::Numeric(y)).unwrap();
        d.add_column("x", Column::Numeric(x)).unwrap();
        d
    }

    fn spec(formula: &str, family: Family) -> ModelSpecification {
        ModelSpecification::new(formula, family, SamplerConfig::default()).unwrap()
    }

    #[test]
    fn test_gaussian_single_draw() {
        let data = dataset(vec![0.0], vec![0.0]);
        let draws = PosteriorDrawSet::new(vec![
            ("b_Intercept".to_string(), vec![0.0]),
            ("b_x".to_string(), vec![1.0]),
            ("sigma".to_string(), vec![1.0]),
        ])
        .unwrap();
        let lpd = pointwise_log_density(&spec("y ~ x", Family::Gaussian), &draws, &data).unwrap();
        // Standard normal log density at 0.
        assert!((lpd[0] + HALF_LN_2PI).abs() < 1e-12);
    }

    #[test]
    fn test_bernoulli_symmetric_at_zero() {
        let data = dataset(vec![1.0, 0.0], vec![0.0, 0.0]);
        let draws = PosteriorDrawSet::new(vec![
            ("b_Intercept".to_string(), vec![0.0, 0.0]),
            ("b_x".to_string(), vec![0.5, -0.5]),
        ])
        .unwrap();
        let lpd = pointwise_log_density(&spec("y ~ x", Family::Bernoulli), &draws, &data).unwrap();
        // eta = 0 for x = 0, so both outcomes have probability one half.
        assert!((lpd[0] - 0.5f64.ln()).abs() < 1e-12);
        assert!((lpd[1] - 0.5f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_bernoulli_rejects_non_binary() {
        let data = dataset(vec![0.5], vec![0.0]);
        let draws = PosteriorDrawSet::new(vec![
            ("b_Intercept".to_string(), vec![0.0]),
            ("b_x".to_string(), vec![0.0]),
        ])
        .unwrap();
        assert!(pointwise_log_density(&spec("y ~ x", Family::Bernoulli), &draws, &data).is_err());
    }

    #[test]
    fn test_shifted_lognormal() {
        let data = dataset(vec![1.5, 0.2], vec![0.0, 0.0]);
        let draws = PosteriorDrawSet::new(vec![
            ("b_Intercept".to_string(), vec![0.0]),
            ("b_x".to_string(), vec![0.0]),
            ("sigma".to_string(), vec![1.0]),
            ("ndt".to_string(), vec![0.5]),
        ])
        .unwrap();
        let lpd =
            pointwise_log_density(&spec("y ~ x", Family::ShiftedLognormal), &draws, &data).unwrap();
        // y - ndt = 1: ln(y-ndt) = 0, density reduces to the standard normal constant.
        assert!((lpd[0] + HALF_LN_2PI).abs() < 1e-12);
        // Response below the shift has zero predictive density.
        assert_eq!(lpd[1], f64::NEG_INFINITY);
    }

    #[test]
    fn test_subject_offset_applied_when_known() {
        let mut data = Dataset::new(vec!["w1".to_string(), "w9".to_string()]).unwrap();
        data.add_column("y", Column::Numeric(vec![2.0, 2.0])).unwrap();
        let draws = PosteriorDrawSet::new(vec![
            ("b_Intercept".to_string(), vec![2.0]),
            ("sigma".to_string(), vec![1.0]),
            ("r_wid[w1]".to_string(), vec![1.0]),
        ])
        .unwrap();
        let lpd =
            pointwise_log_density(&spec("y ~ 1 + (1|wid)", Family::Gaussian), &draws, &data)
                .unwrap();
        // w1 gets eta = 3 (offset applied, z = -1); unseen w9 gets eta = 2 (z = 0).
        assert!(lpd[0] < lpd[1], "offset subject must differ from unseen subject");
        assert!((lpd[1] + HALF_LN_2PI).abs() < 1e-12);
        assert!((lpd[0] - (-HALF_LN_2PI - 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_missing_row_values_fail() {
        let data = dataset(vec![f64::NAN], vec![0.0]);
        let draws = PosteriorDrawSet::new(vec![
            ("b_Intercept".to_string(), vec![0.0]),
            ("b_x".to_string(), vec![0.0]),
            ("sigma".to_string(), vec![1.0]),
        ])
        .unwrap();
        assert!(pointwise_log_density(&spec("y ~ x", Family::Gaussian), &draws, &data).is_err());
    }

    #[test]
    fn test_nonpositive_sigma_draw_is_degenerate() {
        let data = dataset(vec![0.0], vec![0.0]);
        let draws = PosteriorDrawSet::new(vec![
            ("b_Intercept".to_string(), vec![0.0]),
            ("b_x".to_string(), vec![0.0]),
            ("sigma".to_string(), vec![0.0]),
        ])
        .unwrap();
        let err = pointwise_log_density(&spec("y ~ x", Family::Gaussian), &draws, &data);
        assert!(matches!(err, Err(Error::Computation(_))));
    }
}
