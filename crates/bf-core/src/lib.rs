//! # bf-core
//!
//! Core types for behavfit: trial datasets, model specifications, posterior
//! draw storage, and the fitting-backend trait.
//!
//! ## Architecture
//!
//! Estimation and comparison logic (bf-inference) depends on the
//! [`traits::FitBackend`] seam defined here, never on a concrete sampler.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Trial-level dataset storage.
pub mod dataset;
/// Posterior draw storage.
pub mod draws;
/// Error types.
pub mod error;
/// Model specifications: formula, family, sampler configuration.
pub mod model;
/// Fitting-backend trait.
pub mod traits;

pub use dataset::{Column, Dataset, SUBJECT_COLUMN};
pub use draws::PosteriorDrawSet;
pub use error::{Error, Result};
pub use model::{Family, Formula, ModelSpecification, SamplerConfig};
pub use traits::FitBackend;
