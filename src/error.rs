//! Error taxonomy for point cloud alignment.

use thiserror::Error;

/// Errors raised while aligning two point clouds.
///
/// Only [`AlignmentError::InvalidArgument`] and [`AlignmentError::WorkerPool`]
/// ever reach the caller of [`crate::api::align_point_clouds`]; degenerate
/// minimal samples are absorbed by the RANSAC loop.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlignmentError {
    /// The inputs violate a precondition (empty cloud, too few points, bad settings).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A minimal sample produced a singular or non-finite problem.
    #[error("degenerate sample: {0}")]
    DegenerateSample(&'static str),

    /// The worker pool used for parallel iterations could not be created.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AlignmentError>;
