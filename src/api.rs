//! High-level entry point for point cloud alignment.

use crate::choices::ScaleEstimatorChoice;
use crate::core::RansacAligner;
use crate::error::Result;
use crate::estimators::RigidTransformEstimator;
use crate::models::AlignmentResult;
use crate::scoring::NearestNeighborScoring;
use crate::settings::AlignmentSettings;
use crate::types::PointCloud;

/// Estimate the transform mapping `source` onto `target` without known
/// correspondences.
///
/// # Arguments
/// * `source` - Cloud to be transformed (at least 3 points)
/// * `target` - Reference cloud (at least 3 points)
/// * `settings_opt` - Optional settings (uses defaults if None)
///
/// # Returns
/// The best [`AlignmentResult`] found. Failing to find a good alignment is not
/// an error: the result then has few (or zero) inliers.
pub fn align_point_clouds(
    source: &PointCloud,
    target: &PointCloud,
    settings_opt: Option<AlignmentSettings>,
) -> Result<AlignmentResult> {
    let settings = settings_opt.unwrap_or_default();

    let estimator = match ScaleEstimatorChoice::from_settings(&settings) {
        Some(scale) => RigidTransformEstimator::with_scale(scale),
        None => RigidTransformEstimator::new(),
    };
    let scoring = NearestNeighborScoring::new(settings.inlier_threshold);

    RansacAligner::new(settings, estimator, scoring).run(source, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlignmentError;

    #[test]
    fn empty_clouds_are_invalid() {
        let cloud = PointCloud::from_rows(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let empty = PointCloud::default();
        assert!(matches!(
            align_point_clouds(&empty, &cloud, None),
            Err(AlignmentError::InvalidArgument(_))
        ));
        assert!(matches!(
            align_point_clouds(&cloud, &empty, None),
            Err(AlignmentError::InvalidArgument(_))
        ));
    }

    #[test]
    fn translated_triangle_is_recovered() {
        let source = PointCloud::from_rows(&[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [0.0, 3.0, 1.0]]);
        let target = PointCloud::from_rows(&[[1.0, 1.0, 1.0], [5.0, 1.0, 1.0], [1.0, 4.0, 2.0]]);

        let settings = AlignmentSettings::default().with_seed(5).with_workers(1);
        let result = align_point_clouds(&source, &target, Some(settings)).unwrap();
        assert_eq!(result.inlier_count, 3);
        assert_eq!(result.iterations, 1);
        assert!((result.transform.translation - nalgebra::Vector3::new(1.0, 1.0, 1.0)).norm() < 1e-9);
    }
}
