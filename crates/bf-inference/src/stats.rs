//! Shared numeric helpers for draw-sequence summarization.

/// Arithmetic mean.
pub(crate) fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample standard deviation (n−1 denominator; 0 for a single value).
pub(crate) fn sample_sd(xs: &[f64]) -> f64 {
    let n = xs.len();
    if n < 2 {
        return 0.0;
    }
    let mu = mean(xs);
    let ss: f64 = xs.iter().map(|&x| (x - mu) * (x - mu)).sum();
    (ss / (n as f64 - 1.0)).sqrt()
}

/// Ascending copy of `xs`; NaNs sort to the end.
pub(crate) fn sorted_copy(xs: &[f64]) -> Vec<f64> {
    let mut out = xs.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Greater));
    out
}

/// Empirical quantile with linear interpolation between order statistics.
///
/// `sorted` must be ascending. Matches the deterministic convention used for
/// all interval computation: position `q * (n - 1)`.
pub(crate) fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let q = q.clamp(0.0, 1.0);
    let n = sorted.len() as f64;
    let pos = q * (n - 1.0);
    let i0 = pos.floor() as usize;
    let i1 = pos.ceil() as usize;
    if i0 == i1 {
        return sorted[i0];
    }
    let f = pos - i0 as f64;
    sorted[i0] * (1.0 - f) + sorted[i1] * f
}

/// Central interval covering `mass` of the sorted draws, as symmetric
/// quantiles. Monotone in `mass` for a fixed sequence, which yields the
/// 50% ⊆ 80% ⊆ 95% nesting invariant.
pub(crate) fn central_interval(sorted: &[f64], mass: f64) -> (f64, f64) {
    let tail = (1.0 - mass) / 2.0;
    (quantile_sorted(sorted, tail), quantile_sorted(sorted, 1.0 - tail))
}

/// Numerically stable `ln(1 + exp(x))`.
pub(crate) fn log1pexp(x: f64) -> f64 {
    if x <= -37.0 {
        x.exp()
    } else if x <= 18.0 {
        x.exp().ln_1p()
    } else if x <= 33.3 {
        x + (-x).exp()
    } else {
        x
    }
}

/// `ln(mean(exp(xs)))` via the max-shift trick.
///
/// Returns `-inf` when every element is `-inf` (zero predictive density
/// under all draws).
pub(crate) fn log_mean_exp(xs: &[f64]) -> f64 {
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = xs.iter().map(|&x| (x - max).exp()).sum();
    max + (sum / xs.len() as f64).ln()
}
