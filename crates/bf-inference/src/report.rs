//! Result aggregation and CSV output.
//!
//! Heterogeneous result records are tagged with a model or comparison label
//! and concatenated into one flat table per analysis category. Tables are
//! written through a temp-file-and-rename path so a failed run never leaves
//! a partially written table, and file names carry the experiment version
//! so concurrent runs target distinct files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use bf_core::{Error, Result};

use crate::contrast::ContrastSummary;
use crate::crossval::ElpdComparison;
use crate::hypothesis::HypothesisResult;
use crate::summary::CredibleSummary;

/// One row of the credible-summary table.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    /// Model label.
    pub model: String,
    /// Parameter name.
    pub parameter: String,
    /// Draw mean.
    pub estimate: f64,
    /// Draw standard deviation.
    pub error: f64,
    /// 50% interval lower bound.
    pub ci_50_lower: f64,
    /// 50% interval upper bound.
    pub ci_50_upper: f64,
    /// 80% interval lower bound.
    pub ci_80_lower: f64,
    /// 80% interval upper bound.
    pub ci_80_upper: f64,
    /// 95% interval lower bound.
    pub ci_95_lower: f64,
    /// 95% interval upper bound.
    pub ci_95_upper: f64,
}

/// Tag each summary with its model label.
pub fn summary_rows(model: &str, summaries: &[CredibleSummary]) -> Vec<SummaryRow> {
    summaries
        .iter()
        .map(|s| SummaryRow {
            model: model.to_string(),
            parameter: s.parameter.clone(),
            estimate: s.estimate,
            error: s.error,
            ci_50_lower: s.ci_50_lower,
            ci_50_upper: s.ci_50_upper,
            ci_80_lower: s.ci_80_lower,
            ci_80_upper: s.ci_80_upper,
            ci_95_lower: s.ci_95_lower,
            ci_95_upper: s.ci_95_upper,
        })
        .collect()
}

/// One row of the hypothesis table (one per significance level).
#[derive(Debug, Clone, Serialize)]
pub struct HypothesisRow {
    /// Model label.
    pub model: String,
    /// Hypothesis text.
    pub hypothesis: String,
    /// Significance level.
    pub alpha: f64,
    /// Mean of the derived draw sequence.
    pub estimate: f64,
    /// Standard deviation of the derived sequence.
    pub error: f64,
    /// Central interval lower bound at this level.
    pub ci_lower: f64,
    /// Central interval upper bound at this level.
    pub ci_upper: f64,
}

/// Tag each evaluated level with its model label.
pub fn hypothesis_rows(model: &str, result: &HypothesisResult) -> Vec<HypothesisRow> {
    result
        .levels
        .iter()
        .map(|l| HypothesisRow {
            model: model.to_string(),
            hypothesis: result.hypothesis.clone(),
            alpha: l.alpha,
            estimate: l.estimate,
            error: l.error,
            ci_lower: l.ci_lower,
            ci_upper: l.ci_upper,
        })
        .collect()
}

/// One row of the aggregate ELPD comparison table.
#[derive(Debug, Clone, Serialize)]
pub struct ElpdRow {
    /// Comparison label (`<label_b>_vs_<label_a>`).
    pub comparison: String,
    /// Total expected log predictive density difference.
    pub elpd_diff: f64,
    /// Cross-validation standard error of the total.
    pub se_diff: f64,
    /// Optional condition tag (e.g. the `multi_time` level).
    pub timepoint: Option<String>,
}

/// Aggregate row for one comparison, optionally tagged with a condition.
pub fn elpd_row(comparison: &ElpdComparison, timepoint: Option<&str>) -> ElpdRow {
    ElpdRow {
        comparison: format!("{}_vs_{}", comparison.label_b, comparison.label_a),
        elpd_diff: comparison.elpd_diff,
        se_diff: comparison.se_diff,
        timepoint: timepoint.map(str::to_string),
    }
}

/// `{stem}_{version}.csv` inside `dir`.
pub fn versioned_path(dir: &Path, stem: &str, version: &str) -> PathBuf {
    dir.join(format!("{}_{}.csv", stem, version))
}

fn rename_into_place(tmp: &Path, path: &Path) -> Result<()> {
    fs::rename(tmp, path).map_err(|e| {
        let _ = fs::remove_file(tmp);
        Error::Io(e)
    })
}

/// Serialize records to `path` as CSV.
///
/// The table is first written to a sibling temp file and renamed into
/// place; an empty record set is a contract violation (the aggregation
/// produced nothing to persist).
pub fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if rows.is_empty() {
        return Err(Error::Validation(format!(
            "refusing to write empty table '{}'",
            path.display()
        )));
    }
    let tmp = path.with_file_name(format!(
        "{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("table.csv")
    ));

    let mut writer = csv::Writer::from_path(&tmp)?;
    for row in rows {
        if let Err(e) = writer.serialize(row) {
            drop(writer);
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
    }
    if let Err(e) = writer.flush() {
        let _ = fs::remove_file(&tmp);
        return Err(Error::Io(e));
    }
    drop(writer);
    rename_into_place(&tmp, path)?;
    log::info!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Write the per-row diagnostic table for a comparison: one row per data
/// row with `elpd_<label_a>`, `elpd_<label_b>`, and `elpd_diff` columns.
pub fn write_elpd_pointwise(path: &Path, comparison: &ElpdComparison) -> Result<()> {
    let tmp = path.with_file_name(format!(
        "{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("table.csv")
    ));

    let mut writer = csv::Writer::from_path(&tmp)?;
    let result = (|| -> Result<()> {
        writer.write_record([
            format!("elpd_{}", comparison.label_a),
            format!("elpd_{}", comparison.label_b),
            "elpd_diff".to_string(),
        ])?;
        for i in 0..comparison.pointwise_diff.len() {
            writer.write_record([
                comparison.pointwise_a[i].to_string(),
                comparison.pointwise_b[i].to_string(),
                comparison.pointwise_diff[i].to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    })();
    drop(writer);
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    rename_into_place(&tmp, path)
}

/// Tagged contrast rows are already flat; write them directly.
pub fn write_contrast_table(path: &Path, contrasts: &[ContrastSummary]) -> Result<()> {
    write_table(path, contrasts)
}
