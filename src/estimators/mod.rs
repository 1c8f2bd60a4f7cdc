//! Estimators producing candidate alignments from minimal samples.
//!
//! - [`RigidTransformEstimator`]: Kabsch rotation and translation, optionally
//!   combined with a scale estimator
//! - [`AlgebraicScaleEstimator`] / [`NumericScaleEstimator`]: per-axis scale

pub mod rigid_transform;
pub mod scale;

pub use rigid_transform::{kabsch, RigidTransformEstimator};
pub use scale::{AlgebraicScaleEstimator, InverseScaleProblem, NumericScaleEstimator};
