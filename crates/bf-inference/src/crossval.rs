//! K-fold cross-validated model comparison via expected log predictive
//! density (ELPD).
//!
//! Two candidate models are refit K times each, once per held-out fold, on
//! the complement of that fold. Held-out pointwise log predictive densities
//! are reassembled into canonical row order, differenced elementwise
//! (second model minus first, so a positive total favors the second), and
//! aggregated: `elpd_diff = sum(diff)`, `se_diff = sqrt(n) * sd(diff)`.
//!
//! Fold refits are mutually independent and run in parallel via rayon, the
//! same way multi-chain sampling parallelizes chains.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use bf_core::{Dataset, Error, FitBackend, ModelSpecification, Result};

use crate::likelihood::pointwise_log_density;
use crate::stats::sample_sd;

/// Default fold count for cross-validated comparison.
pub const DEFAULT_FOLDS: usize = 10;

/// Partition of dataset row indices into K disjoint, exhaustive folds of
/// near-equal size.
#[derive(Debug, Clone)]
pub struct FoldPartition {
    folds: Vec<Vec<usize>>,
    n_rows: usize,
}

impl FoldPartition {
    /// Randomly partition `n_rows` indices into `k` folds (seeded shuffle,
    /// round-robin assignment; fold sizes differ by at most one).
    pub fn new(n_rows: usize, k: usize, seed: u64) -> Result<Self> {
        if k == 0 {
            return Err(Error::Validation("fold count must be at least 1".to_string()));
        }
        if n_rows < k {
            return Err(Error::Validation(format!(
                "cannot split {} rows into {} folds (need at least one row per fold)",
                n_rows, k
            )));
        }
        let mut idx: Vec<usize> = (0..n_rows).collect();
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        idx.shuffle(&mut rng);

        let mut folds = vec![Vec::with_capacity(n_rows / k + 1); k];
        for (pos, row) in idx.into_iter().enumerate() {
            folds[pos % k].push(row);
        }
        Ok(Self { folds, n_rows })
    }

    /// Number of folds.
    pub fn k(&self) -> usize {
        self.folds.len()
    }

    /// Row indices held out by fold `i`.
    pub fn fold(&self, i: usize) -> &[usize] {
        &self.folds[i]
    }

    /// Row indices of the training complement of fold `i`, ascending.
    pub fn complement(&self, i: usize) -> Vec<usize> {
        let mut rows: Vec<usize> = self
            .folds
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .flat_map(|(_, f)| f.iter().copied())
            .collect();
        rows.sort_unstable();
        rows
    }

    /// Total row count covered by the partition.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }
}

/// Configuration for a K-fold comparison.
#[derive(Debug, Clone, Copy)]
pub struct KfoldConfig {
    /// Number of folds.
    pub k: usize,
    /// Seed for the fold-assignment shuffle.
    pub seed: u64,
}

impl Default for KfoldConfig {
    fn default() -> Self {
        Self { k: DEFAULT_FOLDS, seed: 0 }
    }
}

/// Result of a cross-validated two-model comparison.
#[derive(Debug, Clone)]
pub struct ElpdComparison {
    /// Label of the first model.
    pub label_a: String,
    /// Label of the second model.
    pub label_b: String,
    /// Held-out pointwise log predictive density per row, first model,
    /// canonical row order.
    pub pointwise_a: Vec<f64>,
    /// Held-out pointwise log predictive density per row, second model.
    pub pointwise_b: Vec<f64>,
    /// Elementwise `pointwise_b - pointwise_a`.
    pub pointwise_diff: Vec<f64>,
    /// Sum of the difference sequence; positive favors the second model.
    pub elpd_diff: f64,
    /// `sqrt(n) * sd(pointwise_diff)`.
    pub se_diff: f64,
}

fn fit_and_score(
    backend: &dyn FitBackend,
    spec: &ModelSpecification,
    label: &str,
    fold: usize,
    train: &Dataset,
    held: &Dataset,
) -> Result<Vec<f64>> {
    let draws = backend.fit(spec, train)?;
    if !draws.converged() {
        log::warn!(
            "model '{}' did not converge on fold {} ({}); held-out densities may be unreliable",
            label,
            fold,
            draws.warnings().join("; ")
        );
    }
    pointwise_log_density(spec, &draws, held)
}

/// Compare two models on the same dataset by K-fold cross-validation.
///
/// Each fold refits both models on the remaining K−1 folds and evaluates
/// the held-out rows; fold completion order does not matter because
/// pointwise values are reassembled by original row index before
/// aggregation.
pub fn kfold_compare(
    backend: &dyn FitBackend,
    spec_a: &ModelSpecification,
    spec_b: &ModelSpecification,
    data: &Dataset,
    label_a: &str,
    label_b: &str,
    config: KfoldConfig,
) -> Result<ElpdComparison> {
    let partition = FoldPartition::new(data.n_rows(), config.k, config.seed)?;
    let n = data.n_rows();
    log::info!(
        "k-fold comparison '{}' vs '{}': n={}, k={}, backend={}",
        label_a,
        label_b,
        n,
        partition.k(),
        backend.name()
    );

    // Per fold: (held-out rows, lpd under each model), folds in parallel.
    let fold_scores: Vec<(Vec<usize>, Vec<f64>, Vec<f64>)> = (0..partition.k())
        .into_par_iter()
        .map(|i| {
            let held_rows = partition.fold(i).to_vec();
            let train = data.subset(&partition.complement(i))?;
            let held = data.subset(&held_rows)?;
            let lpd_a = fit_and_score(backend, spec_a, label_a, i, &train, &held)?;
            let lpd_b = fit_and_score(backend, spec_b, label_b, i, &train, &held)?;
            Ok((held_rows, lpd_a, lpd_b))
        })
        .collect::<Result<Vec<_>>>()?;

    // Reassemble into canonical row order.
    let mut pointwise_a = vec![f64::NAN; n];
    let mut pointwise_b = vec![f64::NAN; n];
    for (rows, lpd_a, lpd_b) in fold_scores {
        for ((&row, &a), &b) in rows.iter().zip(&lpd_a).zip(&lpd_b) {
            pointwise_a[row] = a;
            pointwise_b[row] = b;
        }
    }

    let pointwise_diff: Vec<f64> =
        pointwise_b.iter().zip(&pointwise_a).map(|(&b, &a)| b - a).collect();
    let elpd_diff: f64 = pointwise_diff.iter().sum();
    let se_diff = (n as f64).sqrt() * sample_sd(&pointwise_diff);

    Ok(ElpdComparison {
        label_a: label_a.to_string(),
        label_b: label_b.to_string(),
        pointwise_a,
        pointwise_b,
        pointwise_diff,
        elpd_diff,
        se_diff,
    })
}
