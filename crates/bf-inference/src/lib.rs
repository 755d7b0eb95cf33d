//! # bf-inference
//!
//! Bayesian estimation and comparison engine for behavioral experiments.
//!
//! This crate provides the repeated computational core shared by every
//! analysis: posterior summarization at nested credible levels, linear
//! hypothesis evaluation, condition contrasts on paired draws, K-fold
//! cross-validated ELPD comparison, shared-scale normalization, and
//! tagged CSV output.
//!
//! ## Architecture
//!
//! Model fitting is behind the `FitBackend` trait from bf-core; this crate
//! never depends on a concrete sampler.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Per-analysis data preparation policy.
pub mod analysis;
/// Condition contrasts on paired posterior draws.
pub mod contrast;
/// K-fold cross-validated ELPD comparison.
pub mod crossval;
/// Linear hypothesis evaluation.
pub mod hypothesis;
/// Pointwise predictive density per outcome family.
pub mod likelihood;
/// Shared-scale normalization of numeric columns.
pub mod normalize;
/// Result aggregation and CSV output.
pub mod report;
/// Synthetic trial generation from the two candidate decision processes.
pub mod simulate;
mod stats;
/// Posterior summarization: estimates and nested credible intervals.
pub mod summary;

pub use analysis::{AnalysisConfig, MissingDataPolicy};
pub use contrast::{condition_contrast, contrast_parameter, ContrastSummary};
pub use crossval::{kfold_compare, ElpdComparison, FoldPartition, KfoldConfig, DEFAULT_FOLDS};
pub use hypothesis::{evaluate, HypothesisResult, LinearHypothesis, ALPHA_LEVELS};
pub use likelihood::pointwise_log_density;
pub use normalize::shared_max_abs;
pub use simulate::{simulate_tables, EpisodicAgent, FeatureAgent, SimulationConfig};
pub use summary::{summarize, summarize_sequence, CredibleSummary};
