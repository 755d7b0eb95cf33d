//! Per-analysis data preparation policy.
//!
//! Each analysis category declares which columns it requires and what
//! happens to incomplete rows. The missing-row policy is a named,
//! per-analysis choice rather than an implicit side effect of fitting:
//! some analyses deliberately keep incomplete rows for descriptive columns,
//! others must drop them before the model sees the data.

use serde::{Deserialize, Serialize};

use bf_core::{Dataset, Error, Result};

/// What to do with rows that have missing required values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDataPolicy {
    /// Drop any row with a missing required value before fitting.
    DropIncomplete,
    /// Keep all rows; fitting will fail fast if a required value is missing.
    KeepAll,
}

/// Declared data contract for one analysis category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Analysis category name (used in logs and output file stems).
    pub name: String,
    /// Columns the analysis reads; all must exist.
    pub required_columns: Vec<String>,
    /// Missing-row handling for this analysis.
    pub missing_policy: MissingDataPolicy,
    /// Drop rows with a zero response time (response-time models only).
    pub drop_zero_rt: bool,
    /// Response-time column consulted when `drop_zero_rt` is set.
    pub rt_column: Option<String>,
}

impl AnalysisConfig {
    /// Standard configuration: require the given columns, drop incomplete
    /// rows, no response-time filtering.
    pub fn new(name: impl Into<String>, required_columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            required_columns: required_columns.iter().map(|c| c.to_string()).collect(),
            missing_policy: MissingDataPolicy::DropIncomplete,
            drop_zero_rt: false,
            rt_column: None,
        }
    }

    /// Enable zero-response-time filtering on `column`.
    pub fn with_rt_filter(mut self, column: &str) -> Self {
        self.drop_zero_rt = true;
        self.rt_column = Some(column.to_string());
        self
    }

    /// Keep incomplete rows instead of dropping them.
    pub fn keep_all(mut self) -> Self {
        self.missing_policy = MissingDataPolicy::KeepAll;
        self
    }

    /// Apply the declared contract to a dataset, returning the rows the
    /// analysis will fit.
    pub fn prepare(&self, data: &Dataset) -> Result<Dataset> {
        let required: Vec<&str> = self.required_columns.iter().map(String::as_str).collect();
        data.require_columns(&required)?;

        let rows = match self.missing_policy {
            MissingDataPolicy::DropIncomplete => data.complete_rows(&required)?,
            MissingDataPolicy::KeepAll => (0..data.n_rows()).collect(),
        };

        let rows = if self.drop_zero_rt {
            let rt_col = self.rt_column.as_deref().ok_or_else(|| {
                Error::Validation(format!(
                    "analysis '{}' sets drop_zero_rt without an rt column",
                    self.name
                ))
            })?;
            let rt = data.numeric(rt_col)?;
            rows.into_iter().filter(|&i| rt[i] != 0.0).collect()
        } else {
            rows
        };

        let dropped = data.n_rows() - rows.len();
        if dropped > 0 {
            log::info!(
                "analysis '{}': dropped {} of {} rows ({:?})",
                self.name,
                dropped,
                data.n_rows(),
                self.missing_policy
            );
        }
        data.subset(&rows)
    }
}
