//! Rigid transform estimator using Procrustes analysis (Kabsch).

use nalgebra::{Matrix3, Vector3, SVD};

use crate::choices::ScaleEstimatorChoice;
use crate::core::{Estimator, ScaleEstimator};
use crate::error::{AlignmentError, Result};
use crate::models::RigidTransform;
use crate::types::{centroid, Point};

/// Least-squares rotation and translation mapping `source[i]` onto `target[i]`.
///
/// Minimises `sum |R * p + T - q|^2` over at least three pairs. The rotation is
/// always proper: when the SVD yields a reflection, the singular vector of the
/// smallest singular value is flipped. Collinear or coincident inputs are not
/// rejected here; they produce some valid rotation that the scorer later
/// judges on its own merit.
pub fn kabsch(source: &[Point], target: &[Point]) -> Result<(Matrix3<f64>, Vector3<f64>)> {
    if source.len() != target.len() {
        return Err(AlignmentError::InvalidArgument(format!(
            "kabsch needs paired point sets, got {} and {} points",
            source.len(),
            target.len()
        )));
    }
    let (Some(cp), Some(cq)) = (centroid(source), centroid(target)) else {
        return Err(AlignmentError::InvalidArgument(
            "kabsch needs at least 3 point pairs, got 0".to_string(),
        ));
    };
    if source.len() < 3 {
        return Err(AlignmentError::InvalidArgument(format!(
            "kabsch needs at least 3 point pairs, got {}",
            source.len()
        )));
    }

    // Cross-covariance H = sum (p - cp) (q - cq)^T
    let mut h = Matrix3::<f64>::zeros();
    for (p, q) in source.iter().zip(target) {
        h += (p - cp) * (q - cq).transpose();
    }
    if !h.iter().all(|v| v.is_finite()) {
        return Err(AlignmentError::DegenerateSample("non-finite cross-covariance"));
    }

    let svd = SVD::try_new(h, true, true, f64::EPSILON, 1000)
        .ok_or(AlignmentError::DegenerateSample("svd did not converge"))?;
    let (Some(u), Some(mut v_t)) = (svd.u, svd.v_t) else {
        return Err(AlignmentError::DegenerateSample("svd without singular vectors"));
    };

    // SVD: H = U * S * V^T, then R = V * U^T
    let mut r = v_t.transpose() * u.transpose();
    if r.determinant() < 0.0 {
        let k = svd.singular_values.imin();
        v_t.row_mut(k).neg_mut();
        r = v_t.transpose() * u.transpose();
    }

    let t = cq.coords - r * cp.coords;
    if !t.iter().all(|v| v.is_finite()) {
        return Err(AlignmentError::DegenerateSample("non-finite translation"));
    }
    Ok((r, t))
}

/// Minimal-sample estimator for [`RigidTransform`] candidates.
///
/// Without a scale estimator this is plain Kabsch on the two triplets. With
/// one, the per-axis scale `S` is estimated first, the target triplet is
/// de-scaled by `S^-1`, Kabsch runs on the result, and the translation is
/// re-scaled so that the candidate maps `p` to `S * R * p + S * T`.
#[derive(Default)]
pub struct RigidTransformEstimator {
    scale: Option<ScaleEstimatorChoice>,
}

impl RigidTransformEstimator {
    /// Rotation and translation only.
    pub fn new() -> Self {
        Self { scale: None }
    }

    /// Rotation, translation and anisotropic scale.
    pub fn with_scale(scale: ScaleEstimatorChoice) -> Self {
        Self { scale: Some(scale) }
    }

    pub fn estimates_scale(&self) -> bool {
        self.scale.is_some()
    }
}

impl Estimator for RigidTransformEstimator {
    type Model = RigidTransform;

    fn sample_size(&self) -> usize {
        3
    }

    fn estimate_model(&self, source: &[Point], target: &[Point]) -> Result<Self::Model> {
        let Some(scale_estimator) = &self.scale else {
            let (rotation, translation) = kabsch(source, target)?;
            return Ok(RigidTransform::new(rotation, translation));
        };

        let scale = scale_estimator.estimate_scale(source, target)?;
        let inv_scale = Matrix3::from_diagonal(&scale.diagonal().map(|s| 1.0 / s));
        let descaled: Vec<Point> = target
            .iter()
            .map(|q| Point::from(inv_scale * q.coords))
            .collect();

        let (rotation, translation) = kabsch(source, &descaled)?;
        Ok(RigidTransform::with_scale(rotation, scale * translation, scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimators::AlgebraicScaleEstimator;
    use crate::utils::rotation_from_euler_degrees;
    use approx::assert_relative_eq;

    fn triplet() -> Vec<Point> {
        vec![
            Point::new(1.0, 2.0, 3.0),
            Point::new(7.0, 1.0, 4.0),
            Point::new(3.0, 9.0, 2.0),
        ]
    }

    #[test]
    fn kabsch_recovers_rotation_and_translation() {
        let r = rotation_from_euler_degrees(20.0, -35.0, 110.0);
        let t = Vector3::new(20.0, 40.0, 10.0);
        let source = triplet();
        let target: Vec<Point> = source.iter().map(|p| Point::from(r * p.coords + t)).collect();

        let (r_est, t_est) = kabsch(&source, &target).unwrap();
        assert_relative_eq!(r_est, r, epsilon = 1e-9);
        assert_relative_eq!(t_est, t, epsilon = 1e-9);
    }

    #[test]
    fn kabsch_corrects_reflections() {
        let source = triplet();
        // Mirror through the xy-plane: the best orthogonal fit is a reflection.
        let target: Vec<Point> = source.iter().map(|p| Point::new(p.x, p.y, -p.z)).collect();

        let (r, _) = kabsch(&source, &target).unwrap();
        assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(r * r.transpose(), Matrix3::identity(), epsilon = 1e-9);
    }

    #[test]
    fn kabsch_accepts_collinear_points() {
        let source = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 1.0),
            Point::new(2.0, 2.0, 2.0),
        ];
        let target = vec![
            Point::new(5.0, 0.0, 0.0),
            Point::new(5.0, 1.0, 0.0),
            Point::new(5.0, 2.0, 0.0),
        ];

        let (r, t) = kabsch(&source, &target).unwrap();
        assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-9);
        assert!(t.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn kabsch_rejects_bad_input() {
        let source = triplet();
        assert!(matches!(
            kabsch(&source, &source[..2]),
            Err(AlignmentError::InvalidArgument(_))
        ));
        assert!(matches!(
            kabsch(&source[..2], &source[..2]),
            Err(AlignmentError::InvalidArgument(_))
        ));
        assert!(matches!(kabsch(&[], &[]), Err(AlignmentError::InvalidArgument(_))));
    }

    #[test]
    fn kabsch_rejects_non_finite_input() {
        let mut target = triplet();
        target[1].y = f64::NAN;
        assert!(matches!(
            kabsch(&triplet(), &target),
            Err(AlignmentError::DegenerateSample(_))
        ));
    }

    #[test]
    fn scaled_estimator_recovers_full_transform() {
        let r = rotation_from_euler_degrees(0.0, 90.0, 0.0);
        let s = Matrix3::from_diagonal(&Vector3::new(2.0, 3.0, 1.0));
        let t = Vector3::new(20.0, 40.0, 10.0);
        let truth = RigidTransform::with_scale(r, t, s);

        let source = triplet();
        let target: Vec<Point> = source.iter().map(|p| truth.apply(p)).collect();

        let estimator =
            RigidTransformEstimator::with_scale(ScaleEstimatorChoice::Algebraic(AlgebraicScaleEstimator));
        assert!(estimator.estimates_scale());
        let model = estimator.estimate_model(&source, &target).unwrap();

        assert_relative_eq!(model.scale, s, epsilon = 1e-9);
        assert_relative_eq!(model.rotation, r, epsilon = 1e-9);
        assert_relative_eq!(model.translation, t, epsilon = 1e-9);
        for (p, q) in source.iter().zip(&target) {
            assert_relative_eq!(model.apply(p), *q, epsilon = 1e-9);
        }
    }

    #[test]
    fn unscaled_estimator_keeps_identity_scale() {
        let source = triplet();
        let target: Vec<Point> = source.iter().map(|p| p + Vector3::new(1.0, -2.0, 3.0)).collect();

        let model = RigidTransformEstimator::new()
            .estimate_model(&source, &target)
            .unwrap();
        assert_eq!(model.scale, Matrix3::identity());
        assert_relative_eq!(model.translation, Vector3::new(1.0, -2.0, 3.0), epsilon = 1e-9);
    }
}
