//! Fitting-backend seam.
//!
//! The sampling engine itself is an external collaborator: behavfit treats a
//! "fit" as an atomic, blocking operation that turns a model specification
//! and a dataset into a complete set of posterior draws. This trait is the
//! dependency-inversion point — comparison and summarization logic never
//! depends on a concrete sampler.

use crate::dataset::Dataset;
use crate::draws::PosteriorDrawSet;
use crate::model::ModelSpecification;
use crate::Result;

/// A backend capable of drawing posterior samples for a specified model.
///
/// Implementations must be `Send + Sync`: cross-validated comparison refits
/// folds in parallel against a single shared backend.
pub trait FitBackend: Send + Sync {
    /// Fit `spec` to `data`, blocking until a complete draw set is available.
    ///
    /// Backends that detect non-convergence must still return the draw set,
    /// flagged via [`PosteriorDrawSet::mark_nonconverged`], rather than
    /// failing — retry policy belongs to the caller.
    fn fit(&self, spec: &ModelSpecification, data: &Dataset) -> Result<PosteriorDrawSet>;

    /// Backend name for logs and diagnostics.
    fn name(&self) -> &str;
}
