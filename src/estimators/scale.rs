//! Anisotropic scale estimation from a minimal sample.
//!
//! Under `q = S * R * p + T` every target pair delta satisfies
//! `|S^-1 * dq| = |dp|`. Writing `w = 1 / s` per axis, the three pairs
//! `(0, 1)`, `(0, 2)` and `(1, 2)` of a triplet give
//!
//! ```text
//! dq_x^2 * w_x^2 + dq_y^2 * w_y^2 + dq_z^2 * w_z^2 = |dp|^2
//! ```
//!
//! which is linear in `w^2`. Column `a` of that system grows with `s_a^2`,
//! so both strategies work on a copy with unit-norm columns and a unit-norm
//! right-hand side. [`AlgebraicScaleEstimator`] solves it directly;
//! [`NumericScaleEstimator`] fits it with Levenberg-Marquardt starting from
//! `(1, 1, 1)` in the normalised variables.

use argmin::core::{ArgminError, Error, Jacobian, Operator};
use log::trace;
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

use crate::core::ScaleEstimator;
use crate::error::{AlignmentError, Result};
use crate::least_squares::LevenbergMarquardt;
use crate::settings::ScaleRefinementSettings;
use crate::types::Point;
use crate::utils::gauss_elimination;

const PAIRS: [(usize, usize); 3] = [(0, 1), (0, 2), (1, 2)];

/// Residual norm of the normalised system above which a numeric fit is rejected.
const FIT_TOLERANCE: f64 = 1e-6;

/// Pair equations with unit-norm columns and right-hand side.
///
/// The normalised unknown is `y_a = w_a^2 / unscale_a`.
#[derive(Debug, Clone, Copy)]
struct PairSystem {
    a: Matrix3<f64>,
    b: Vector3<f64>,
    unscale: Vector3<f64>,
}

impl PairSystem {
    fn new(source: &[Point], target: &[Point]) -> Result<Self> {
        if source.len() != 3 || target.len() != 3 {
            return Err(AlignmentError::InvalidArgument(format!(
                "scale estimation needs two triplets, got {} and {} points",
                source.len(),
                target.len()
            )));
        }

        let mut a = Matrix3::zeros();
        let mut b = Vector3::zeros();
        for (k, &(i, j)) in PAIRS.iter().enumerate() {
            let dq = target[j] - target[i];
            a.set_row(k, &dq.component_mul(&dq).transpose());
            b[k] = (source[j] - source[i]).norm_squared();
        }

        let rhs_norm = b.norm();
        let column_norms = Vector3::from_fn(|c, _| a.column(c).norm());
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(rhs_norm) || !column_norms.iter().all(|&c| usable(c)) {
            return Err(AlignmentError::DegenerateSample("scale sample has no extent along an axis"));
        }

        for c in 0..3 {
            let mut column = a.column_mut(c);
            column /= column_norms[c];
        }
        Ok(Self {
            a,
            b: b / rhs_norm,
            unscale: column_norms.map(|c| rhs_norm / c),
        })
    }

    fn solve(&self) -> Result<Vector3<f64>> {
        gauss_elimination(&self.a, &self.b)
            .ok_or(AlignmentError::DegenerateSample("singular scale system"))
    }

    /// `diag(1 / w)` from the normalised squared unknowns, rejecting zero or
    /// non-finite factors.
    fn scale_matrix(&self, y: &Vector3<f64>) -> Result<Matrix3<f64>> {
        let s = y.component_mul(&self.unscale).map(|v| 1.0 / v.sqrt());
        if !s.iter().all(|v| v.is_finite() && *v > 0.0) {
            return Err(AlignmentError::DegenerateSample("non-finite scale factor"));
        }
        Ok(Matrix3::from_diagonal(&s))
    }
}

/// Closed-form scale from the pair equations.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlgebraicScaleEstimator;

impl ScaleEstimator for AlgebraicScaleEstimator {
    fn estimate_scale(&self, source: &[Point], target: &[Point]) -> Result<Matrix3<f64>> {
        let system = PairSystem::new(source, target)?;
        let y = system.solve()?;
        if !y.iter().all(|v| *v > 0.0) {
            return Err(AlignmentError::DegenerateSample("negative squared scale"));
        }
        system.scale_matrix(&y)
    }
}

/// Residuals `sum_a A[k, a] * u_a^2 - b[k]` of the normalised pair equations,
/// where `u_a^2 = w_a^2 / unscale_a`.
#[derive(Debug, Clone)]
pub struct InverseScaleProblem {
    system: PairSystem,
}

impl InverseScaleProblem {
    pub fn new(source: &[Point], target: &[Point]) -> Result<Self> {
        Ok(Self {
            system: PairSystem::new(source, target)?,
        })
    }

    /// Parameters corresponding to the per-axis inverse scale `w`.
    pub fn params_from_inverse_scale(&self, w: &Vector3<f64>) -> DVector<f64> {
        let u = w.zip_map(&self.system.unscale, |w, k| w / k.sqrt());
        DVector::from_column_slice(u.as_slice())
    }

    fn check_len(param: &DVector<f64>) -> std::result::Result<(), Error> {
        if param.len() != 3 {
            return Err(ArgminError::InvalidParameter {
                text: format!("expected 3 inverse scale factors, got {}", param.len()),
            }
            .into());
        }
        Ok(())
    }
}

impl Operator for InverseScaleProblem {
    type Param = DVector<f64>;
    type Output = DVector<f64>;

    fn apply(&self, param: &Self::Param) -> std::result::Result<Self::Output, Error> {
        Self::check_len(param)?;
        let u_sq = Vector3::new(param[0] * param[0], param[1] * param[1], param[2] * param[2]);
        let r = self.system.a * u_sq - self.system.b;
        Ok(DVector::from_column_slice(r.as_slice()))
    }
}

impl Jacobian for InverseScaleProblem {
    type Param = DVector<f64>;
    type Jacobian = DMatrix<f64>;

    fn jacobian(&self, param: &Self::Param) -> std::result::Result<Self::Jacobian, Error> {
        Self::check_len(param)?;
        Ok(DMatrix::from_fn(3, 3, |k, a| 2.0 * self.system.a[(k, a)] * param[a]))
    }
}

/// Levenberg-Marquardt fit of the inverse scale.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericScaleEstimator {
    solver: LevenbergMarquardt,
}

impl NumericScaleEstimator {
    pub fn new(settings: &ScaleRefinementSettings) -> Self {
        Self {
            solver: LevenbergMarquardt::from_settings(settings),
        }
    }
}

impl ScaleEstimator for NumericScaleEstimator {
    fn estimate_scale(&self, source: &[Point], target: &[Point]) -> Result<Matrix3<f64>> {
        let problem = InverseScaleProblem::new(source, target)?;
        // Same singularity criterion as the closed form.
        problem.system.solve()?;

        let report = self
            .solver
            .minimize(&problem, DVector::from_element(3, 1.0))
            .map_err(|e| {
                trace!("scale refinement failed: {e}");
                AlignmentError::DegenerateSample("scale refinement failed")
            })?;

        let residual = (2.0 * report.cost).sqrt();
        if !(residual <= FIT_TOLERANCE) {
            trace!(
                "scale refinement left residual {residual:e} after {} iterations",
                report.iterations
            );
            return Err(AlignmentError::DegenerateSample("scale equations have no positive solution"));
        }
        let p = &report.params;
        problem
            .system
            .scale_matrix(&Vector3::new(p[0] * p[0], p[1] * p[1], p[2] * p[2]))
    }
}
