//! Runtime wrappers exposing built-in components via enums while the core
//! [`RansacAligner`](crate::core::RansacAligner) stays generic. Each enum holds
//! the concrete variants plus a `Dyn` escape hatch for custom implementations.

use nalgebra::Matrix3;

use crate::core::ScaleEstimator;
use crate::error::Result;
use crate::estimators::{AlgebraicScaleEstimator, NumericScaleEstimator};
use crate::settings::{AlignmentSettings, ScaleEstimatorType};
use crate::types::Point;

/// Runtime scale estimator selection.
pub enum ScaleEstimatorChoice {
    Algebraic(AlgebraicScaleEstimator),
    Numeric(NumericScaleEstimator),
    Dyn(Box<dyn ScaleEstimator + Send + Sync>),
}

impl ScaleEstimatorChoice {
    /// Estimator selected by `settings`, or `None` when scale is disabled.
    pub fn from_settings(settings: &AlignmentSettings) -> Option<Self> {
        if !settings.enable_scale {
            return None;
        }
        Some(match settings.scale_estimator {
            ScaleEstimatorType::Algebraic => ScaleEstimatorChoice::Algebraic(AlgebraicScaleEstimator),
            ScaleEstimatorType::Numeric => {
                ScaleEstimatorChoice::Numeric(NumericScaleEstimator::new(&settings.scale_refinement))
            }
        })
    }
}

impl ScaleEstimator for ScaleEstimatorChoice {
    fn estimate_scale(&self, source: &[Point], target: &[Point]) -> Result<Matrix3<f64>> {
        match self {
            ScaleEstimatorChoice::Algebraic(e) => e.estimate_scale(source, target),
            ScaleEstimatorChoice::Numeric(e) => e.estimate_scale(source, target),
            ScaleEstimatorChoice::Dyn(e) => e.estimate_scale(source, target),
        }
    }
}
