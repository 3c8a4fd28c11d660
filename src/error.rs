//! Error types returned by the uniformization engine

use thiserror::Error as ThisError;

/// Error type returned when an engine operation fails
///
/// Cancellation is intentionally *not* a variant here: a user-requested stop
/// is communicated structurally through the negative step count returned by
/// [`crate::corpus::Corpus::distribute`].
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum EngineError {
    /// Raised when the engine configuration is invalid: fewer than 3 points,
    /// a region with non-positive area, degenerate bounds (xmin == xmax or
    /// ymin == ymax), or a density function that is not strictly positive at
    /// a sampled point.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The triangulator rejected the current point set (collinear or
    /// coincident points).
    #[error("triangulation failed on degenerate input: {0}")]
    DegenerateInput(String),

    /// `nearest_on_boundary` failed to produce a point on a valid region.
    /// Should be unreachable for a region that passed validation; treated as
    /// a bug class rather than a normal runtime error.
    #[error("region boundary projection failed: {0}")]
    RegionUnreachable(String),

    /// Catch-all for unclassified failures that don't fit another variant.
    #[error("unknown engine error")]
    Other(#[from] anyhow::Error),
}
