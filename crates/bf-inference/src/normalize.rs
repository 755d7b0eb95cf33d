//! Shared-scale normalization of numeric columns.
//!
//! A set of columns is rescaled by one shared maximum-absolute-value
//! factor. This keeps zero fixed and preserves relative magnitude and sign
//! across columns, so downstream regression coefficients are comparable
//! across columns that originally had different ranges.

use bf_core::{Dataset, Error, Result};

/// Divide every value of the named numeric columns by their shared
/// maximum absolute value (missing entries ignored). Returns the factor.
///
/// Errors: no finite values across the columns is a data-contract
/// violation; a shared maximum of exactly zero is a degenerate numeric
/// condition (division undefined), signaled distinctly.
pub fn shared_max_abs(data: &mut Dataset, columns: &[&str]) -> Result<f64> {
    if columns.is_empty() {
        return Err(Error::Validation("no columns named for normalization".to_string()));
    }

    let mut max_abs = f64::NEG_INFINITY;
    let mut any_finite = false;
    for name in columns {
        for &v in data.numeric(name)? {
            if v.is_finite() {
                any_finite = true;
                max_abs = max_abs.max(v.abs());
            }
        }
    }
    if !any_finite {
        return Err(Error::Validation(format!(
            "normalization target columns [{}] contain no finite values",
            columns.join(", ")
        )));
    }
    if max_abs == 0.0 {
        return Err(Error::Computation(format!(
            "normalization factor for [{}] is zero (all values exactly zero)",
            columns.join(", ")
        )));
    }

    for name in columns {
        for v in data.numeric_mut(name)?.iter_mut() {
            if v.is_finite() {
                *v /= max_abs;
            }
        }
    }
    log::debug!("normalized [{}] by shared factor {}", columns.join(", "), max_abs);
    Ok(max_abs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_core::Column;

    fn data(cols: Vec<(&str, Vec<f64>)>) -> Dataset {
        let n = cols[0].1.len();
        let mut d = Dataset::new((0..n).map(|i| format!("w{}", i)).collect()).unwrap();
        for (name, v) in cols {
            d.add_column(name, Column::Numeric(v)).unwrap();
        }
        d
    }

    #[test]
    fn test_shared_factor_across_columns() {
        let mut d = data(vec![
            ("outcome", vec![-4.0, 2.0, f64::NAN, 8.0]),
            ("remembered_outcome", vec![1.0, -8.0, 3.0, f64::NAN]),
        ]);
        let factor = shared_max_abs(&mut d, &["outcome", "remembered_outcome"]).unwrap();
        assert_eq!(factor, 8.0);

        let a = d.numeric("outcome").unwrap();
        assert!((a[0] + 0.5).abs() < 1e-12);
        assert!((a[3] - 1.0).abs() < 1e-12);
        assert!(a[2].is_nan(), "missing entries stay missing");

        let b = d.numeric("remembered_outcome").unwrap();
        assert!((b[1] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_roundtrip_and_zero_fixed_point() {
        let original = vec![0.0, -3.5, 7.0, 1.25];
        let mut d = data(vec![("outcome", original.clone())]);
        let factor = shared_max_abs(&mut d, &["outcome"]).unwrap();
        let scaled = d.numeric("outcome").unwrap();
        assert_eq!(scaled[0], 0.0, "zero must map to zero");
        for (s, o) in scaled.iter().zip(&original) {
            assert!((s * factor - o).abs() < 1e-12, "re-multiplying must reconstruct");
        }
    }

    #[test]
    fn test_degenerate_inputs() {
        // All-missing: data contract violation.
        let mut d = data(vec![("outcome", vec![f64::NAN, f64::NAN])]);
        assert!(matches!(
            shared_max_abs(&mut d, &["outcome"]),
            Err(Error::Validation(_))
        ));

        // All exactly zero: degenerate numeric condition, distinct signal.
        let mut d = data(vec![("outcome", vec![0.0, 0.0, f64::NAN])]);
        assert!(matches!(
            shared_max_abs(&mut d, &["outcome"]),
            Err(Error::Computation(_))
        ));

        // Unknown column.
        let mut d = data(vec![("outcome", vec![1.0])]);
        assert!(shared_max_abs(&mut d, &["absent"]).is_err());
        assert!(shared_max_abs(&mut d, &[]).is_err());
    }
}
