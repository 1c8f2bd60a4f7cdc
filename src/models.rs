//! Transformation and result types produced by the aligner.
//!
//! A [`RigidTransform`] maps a source point `p` to `q = S * R * p + T`, where
//! `S` is a diagonal scale (identity when scale estimation is disabled), `R` a
//! proper rotation and `T` a translation. Every estimator in the crate uses
//! this one composition order.

use nalgebra::{Matrix3, Matrix4, Rotation3, UnitQuaternion, Vector3};

use crate::types::Point;

/// Rotation, translation and diagonal scale aligning a source cloud to a target.
#[derive(Clone, Debug, PartialEq)]
pub struct RigidTransform {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
    pub scale: Matrix3<f64>,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
            scale: Matrix3::identity(),
        }
    }

    /// Unscaled transform.
    pub fn new(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
            scale: Matrix3::identity(),
        }
    }

    pub fn with_scale(rotation: Matrix3<f64>, translation: Vector3<f64>, scale: Matrix3<f64>) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }

    /// Map a source point into the target frame: `S * R * p + T`.
    pub fn apply(&self, p: &Point) -> Point {
        Point::from(self.scale * (self.rotation * p.coords) + self.translation)
    }

    /// Map a target point back into the source frame: `R^T * S^-1 * (q - T)`.
    ///
    /// A zero scale factor yields non-finite coordinates.
    pub fn apply_inverse(&self, q: &Point) -> Point {
        let inv_scale = Matrix3::from_diagonal(&self.scale_factors().map(|s| 1.0 / s));
        Point::from(self.rotation.transpose() * (inv_scale * (q.coords - self.translation)))
    }

    /// Diagonal of the scale matrix.
    pub fn scale_factors(&self) -> Vector3<f64> {
        self.scale.diagonal()
    }

    /// Homogeneous 4x4 matrix `[S*R | T]`.
    pub fn to_matrix4(&self) -> Matrix4<f64> {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&(self.scale * self.rotation));
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        m
    }

    pub fn to_unit_quaternion(&self) -> UnitQuaternion<f64> {
        let rot3 = Rotation3::from_matrix_unchecked(self.rotation);
        UnitQuaternion::from_rotation_matrix(&rot3)
    }
}

/// Best model found by one RANSAC run.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignmentResult {
    pub transform: RigidTransform,
    /// Transformed source points whose nearest target lies within the threshold.
    pub inlier_count: usize,
    /// Sum of squared nearest-neighbour distances over the whole source cloud.
    pub total_error: f64,
    /// Iterations consumed, including skipped ones.
    pub iterations: usize,
}
