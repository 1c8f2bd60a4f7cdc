//! Configuration types for the RANSAC aligner.
//!
//! [`AlignmentSettings`] groups every option recognised by the driver, with
//! nested settings for the numeric scale refinement. Defaults reproduce the
//! reference behaviour: 10 000 iterations without scale, 1 000 with scale, a
//! squared-distance inlier threshold of 1 and early exit at half the source
//! cloud.

use crate::error::{AlignmentError, Result};

/// Strategy used to estimate the anisotropic scale from a minimal sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleEstimatorType {
    /// Closed-form 3x3 linear solve.
    Algebraic,
    /// Levenberg-Marquardt refinement seeded at unit scale.
    Numeric,
}

/// Rule deciding whether a candidate replaces the current best model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptanceRule {
    /// Replace when the candidate has more inliers *or* a lower total error.
    ///
    /// A candidate with fewer inliers but a lower error still wins, so the
    /// best inlier count can go down during a run.
    InliersOrError,
    /// Replace when the candidate has more inliers, or as many with a lower error.
    Lexicographic,
}

/// Settings for the Levenberg-Marquardt loop of the numeric scale estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRefinementSettings {
    pub max_iterations: usize,
    /// Relative step size below which the refinement stops.
    pub tolerance: f64,
    pub initial_damping: f64,
}

impl Default for ScaleRefinementSettings {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-12,
            initial_damping: 1e-3,
        }
    }
}

/// Main configuration object for an alignment run.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentSettings {
    /// Estimate a per-axis scale in addition to rotation and translation.
    pub enable_scale: bool,
    /// A transformed source point is an inlier when its squared distance to the
    /// nearest target point is strictly below this value.
    pub inlier_threshold: f64,
    /// Iteration budget when scale estimation is disabled.
    pub max_iterations_unscaled: usize,
    /// Iteration budget when scale estimation is enabled.
    pub max_iterations_scaled: usize,
    /// Base seed; iteration `i` samples with `seed + i`. Drawn at random when unset.
    pub random_seed: Option<u64>,

    pub scale_estimator: ScaleEstimatorType,
    pub scale_refinement: ScaleRefinementSettings,
    pub acceptance: AcceptanceRule,
    /// Stop once the best model has `ceil(source_len * ratio)` inliers. Must be in `(0, 1]`.
    pub early_exit_ratio: f64,
    /// Worker threads for parallel iterations; 0 lets rayon decide, 1 runs in-line.
    pub num_workers: usize,
    /// Iterations evaluated per parallel batch.
    pub batch_size: usize,
}

impl Default for AlignmentSettings {
    fn default() -> Self {
        Self {
            enable_scale: false,
            inlier_threshold: 1.0,
            max_iterations_unscaled: 10_000,
            max_iterations_scaled: 1_000,
            random_seed: None,
            scale_estimator: ScaleEstimatorType::Numeric,
            scale_refinement: ScaleRefinementSettings::default(),
            acceptance: AcceptanceRule::InliersOrError,
            early_exit_ratio: 0.5,
            num_workers: 0,
            batch_size: 64,
        }
    }
}

impl AlignmentSettings {
    /// Default settings with scale estimation switched on.
    pub fn scaled() -> Self {
        Self {
            enable_scale: true,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    /// Iteration budget for the current scale mode.
    pub fn max_iterations(&self) -> usize {
        if self.enable_scale {
            self.max_iterations_scaled
        } else {
            self.max_iterations_unscaled
        }
    }

    /// Inlier count at which the driver stops early for a source cloud of `source_len` points.
    pub fn early_exit_inliers(&self, source_len: usize) -> usize {
        (source_len as f64 * self.early_exit_ratio).ceil() as usize
    }

    /// Check option ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.inlier_threshold.is_finite() || self.inlier_threshold < 0.0 {
            return Err(AlignmentError::InvalidArgument(format!(
                "inlier threshold must be finite and non-negative, got {}",
                self.inlier_threshold
            )));
        }
        if !(self.early_exit_ratio > 0.0 && self.early_exit_ratio <= 1.0) {
            return Err(AlignmentError::InvalidArgument(format!(
                "early exit ratio must lie in (0, 1], got {}",
                self.early_exit_ratio
            )));
        }
        if self.batch_size == 0 {
            return Err(AlignmentError::InvalidArgument(
                "batch size must be positive".to_string(),
            ));
        }
        if self.scale_refinement.initial_damping <= 0.0 || !self.scale_refinement.tolerance.is_finite() {
            return Err(AlignmentError::InvalidArgument(
                "scale refinement needs a positive damping and a finite tolerance".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_reference_behaviour() {
        let cfg = AlignmentSettings::default();
        assert!(!cfg.enable_scale);
        assert!((cfg.inlier_threshold - 1.0).abs() < 1e-12);
        assert_eq!(cfg.max_iterations_unscaled, 10_000);
        assert_eq!(cfg.max_iterations_scaled, 1_000);
        assert_eq!(cfg.random_seed, None);
        assert_eq!(cfg.scale_estimator, ScaleEstimatorType::Numeric);
        assert_eq!(cfg.acceptance, AcceptanceRule::InliersOrError);
        assert_eq!(cfg.scale_refinement, ScaleRefinementSettings::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn budget_follows_scale_mode() {
        let unscaled = AlignmentSettings::default();
        let scaled = AlignmentSettings::scaled();
        assert_eq!(unscaled.max_iterations(), 10_000);
        assert_eq!(scaled.max_iterations(), 1_000);
    }

    #[test]
    fn early_exit_rounds_up() {
        let cfg = AlignmentSettings::default();
        assert_eq!(cfg.early_exit_inliers(5), 3);
        assert_eq!(cfg.early_exit_inliers(8), 4);

        let strict = AlignmentSettings {
            early_exit_ratio: 1.0,
            ..AlignmentSettings::default()
        };
        assert_eq!(strict.early_exit_inliers(5), 5);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let bad_threshold = AlignmentSettings {
            inlier_threshold: f64::NAN,
            ..AlignmentSettings::default()
        };
        assert!(matches!(
            bad_threshold.validate(),
            Err(AlignmentError::InvalidArgument(_))
        ));

        let bad_ratio = AlignmentSettings {
            early_exit_ratio: 0.0,
            ..AlignmentSettings::default()
        };
        assert!(bad_ratio.validate().is_err());

        let bad_batch = AlignmentSettings {
            batch_size: 0,
            ..AlignmentSettings::default()
        };
        assert!(bad_batch.validate().is_err());
    }
}
