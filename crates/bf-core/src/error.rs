//! Error types for behavfit

use thiserror::Error;

/// behavfit error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Validation error (data contract violation)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Computation error (degenerate numeric condition)
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
