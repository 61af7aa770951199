//! Clustering traits.

use crate::error::Result;

/// Integer cluster label. [`NOISE`](super::NOISE) (`-1`) marks unassigned points.
pub type ClusterId = i32;

/// Trait for clustering algorithms.
///
/// Implementations are treated as black boxes by the pairwise engine: they
/// receive the projected points of one feature pair and return one label per
/// point.
pub trait Clustering {
    /// Fit the model to data and return cluster assignments.
    ///
    /// Returns a vector of cluster labels, one per input point.
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<ClusterId>>;

    /// Short algorithm name, used for provenance and logging.
    fn name(&self) -> &'static str;

    /// Whether scaling every coordinate by one positive factor leaves the
    /// labels unchanged. Lets callers shrink very large inputs before the
    /// `f32` conversion.
    fn is_scale_invariant(&self) -> bool {
        false
    }
}
