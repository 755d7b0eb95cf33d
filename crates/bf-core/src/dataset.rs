//! Trial-level dataset storage.
//!
//! A [`Dataset`] is an ordered sequence of trial records held column-wise:
//! one subject-identifier column (`wid`) plus named numeric and categorical
//! covariate/outcome columns. Numeric columns use `NaN` as the missing
//! marker; categorical columns use `None`.

use crate::{Error, Result};

/// Conventional name of the subject-identifier column.
pub const SUBJECT_COLUMN: &str = "wid";

/// A single named column of trial data.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Numeric values; `NaN` marks a missing entry.
    Numeric(Vec<f64>),
    /// Categorical string levels; `None` marks a missing entry.
    Categorical(Vec<Option<String>>),
}

impl Column {
    fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    fn is_missing(&self, row: usize) -> bool {
        match self {
            Column::Numeric(v) => v[row].is_nan(),
            Column::Categorical(v) => v[row].is_none(),
        }
    }

    fn subset(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(rows.iter().map(|&i| v[i]).collect()),
            Column::Categorical(v) => {
                Column::Categorical(rows.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// Column-oriented trial dataset with a required subject identifier.
#[derive(Debug, Clone)]
pub struct Dataset {
    wid: Vec<String>,
    columns: Vec<(String, Column)>,
}

impl Dataset {
    /// Create a dataset from subject identifiers. Columns are added with
    /// [`Dataset::add_column`].
    ///
    /// Every identifier must be non-empty (subject identifier non-null
    /// invariant).
    pub fn new(wid: Vec<String>) -> Result<Self> {
        if let Some(i) = wid.iter().position(|w| w.is_empty()) {
            return Err(Error::Validation(format!(
                "subject identifier must be non-empty (row {})",
                i
            )));
        }
        Ok(Self { wid, columns: Vec::new() })
    }

    /// Add a named column. The column must match the dataset's row count and
    /// the name must be unused (and not `wid`).
    pub fn add_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if name == SUBJECT_COLUMN {
            return Err(Error::Validation(format!(
                "column name '{}' is reserved for the subject identifier",
                SUBJECT_COLUMN
            )));
        }
        if self.columns.iter().any(|(n, _)| *n == name) {
            return Err(Error::Validation(format!("duplicate column '{}'", name)));
        }
        if column.len() != self.wid.len() {
            return Err(Error::Validation(format!(
                "column '{}' has {} rows, expected {}",
                name,
                column.len(),
                self.wid.len()
            )));
        }
        self.columns.push((name, column));
        Ok(())
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.wid.len()
    }

    /// Subject identifiers, row-aligned.
    pub fn subjects(&self) -> &[String] {
        &self.wid
    }

    /// Column names in insertion order (excluding `wid`).
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Numeric column by name; errors if absent or categorical.
    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        match self.column(name) {
            Some(Column::Numeric(v)) => Ok(v),
            Some(Column::Categorical(_)) => {
                Err(Error::Validation(format!("column '{}' is categorical, expected numeric", name)))
            }
            None => Err(Error::Validation(format!("missing required column '{}'", name))),
        }
    }

    /// Mutable numeric column by name; errors if absent or categorical.
    pub fn numeric_mut(&mut self, name: &str) -> Result<&mut Vec<f64>> {
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, Column::Numeric(v))) => Ok(v),
            Some((_, Column::Categorical(_))) => {
                Err(Error::Validation(format!("column '{}' is categorical, expected numeric", name)))
            }
            None => Err(Error::Validation(format!("missing required column '{}'", name))),
        }
    }

    /// Categorical column by name; errors if absent or numeric.
    pub fn categorical(&self, name: &str) -> Result<&[Option<String>]> {
        match self.column(name) {
            Some(Column::Categorical(v)) => Ok(v),
            Some(Column::Numeric(_)) => {
                Err(Error::Validation(format!("column '{}' is numeric, expected categorical", name)))
            }
            None => Err(Error::Validation(format!("missing required column '{}'", name))),
        }
    }

    /// Check that every named column exists (the `wid` name refers to the
    /// subject identifier, which always exists).
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        for name in names {
            if *name != SUBJECT_COLUMN && self.column(name).is_none() {
                return Err(Error::Validation(format!("missing required column '{}'", name)));
            }
        }
        Ok(())
    }

    /// Row indices where none of the named columns is missing.
    pub fn complete_rows(&self, required: &[&str]) -> Result<Vec<usize>> {
        self.require_columns(required)?;
        let cols: Vec<&Column> = required
            .iter()
            .filter(|n| **n != SUBJECT_COLUMN)
            .filter_map(|n| self.column(n))
            .collect();
        Ok((0..self.n_rows())
            .filter(|&i| cols.iter().all(|c| !c.is_missing(i)))
            .collect())
    }

    /// New dataset containing the given rows, in the given order.
    ///
    /// Row indices must be in range; this is a programming contract, checked
    /// up front.
    pub fn subset(&self, rows: &[usize]) -> Result<Dataset> {
        if let Some(&bad) = rows.iter().find(|&&i| i >= self.n_rows()) {
            return Err(Error::Validation(format!(
                "row index {} out of range (n_rows={})",
                bad,
                self.n_rows()
            )));
        }
        let wid = rows.iter().map(|&i| self.wid[i].clone()).collect();
        let columns =
            self.columns.iter().map(|(n, c)| (n.clone(), c.subset(rows))).collect();
        Ok(Dataset { wid, columns })
    }
}
