//! Small dense Levenberg-Marquardt solver.
//!
//! Problems are described with argmin's [`Operator`] (residual vector) and
//! [`Jacobian`] traits; the damped normal equations are solved with a
//! Cholesky factorisation. The solver is sized for a handful of parameters,
//! such as the three per-axis factors of the scale estimator.

use argmin::core::{Error, Jacobian, Operator};
use log::trace;
use nalgebra::{DMatrix, DVector};

use crate::settings::ScaleRefinementSettings;

const MIN_DAMPING: f64 = 1e-12;
const MAX_DAMPING: f64 = 1e12;

/// Outcome of a [`LevenbergMarquardt::minimize`] run.
#[derive(Debug, Clone)]
pub struct LmReport {
    pub params: DVector<f64>,
    /// Half the squared residual norm at `params`.
    pub cost: f64,
    pub iterations: usize,
    /// `false` when the iteration cap was hit first.
    pub converged: bool,
}

/// Levenberg-Marquardt with Marquardt's diagonal scaling.
#[derive(Debug, Clone, Copy)]
pub struct LevenbergMarquardt {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub initial_damping: f64,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self::from_settings(&ScaleRefinementSettings::default())
    }
}

fn half_squared_norm(r: &DVector<f64>) -> f64 {
    0.5 * r.norm_squared()
}

impl LevenbergMarquardt {
    pub fn from_settings(settings: &ScaleRefinementSettings) -> Self {
        Self {
            max_iterations: settings.max_iterations,
            tolerance: settings.tolerance,
            initial_damping: settings.initial_damping,
        }
    }

    /// Minimise `0.5 * |r(x)|^2` starting from `init`.
    ///
    /// Errors raised by the problem are propagated; a non-finite trial cost
    /// is treated like a rejected step.
    pub fn minimize<P>(&self, problem: &P, init: DVector<f64>) -> Result<LmReport, Error>
    where
        P: Operator<Param = DVector<f64>, Output = DVector<f64>>
            + Jacobian<Param = DVector<f64>, Jacobian = DMatrix<f64>>,
    {
        let mut x = init;
        let mut r = problem.apply(&x)?;
        let mut cost = half_squared_norm(&r);
        let mut lambda = self.initial_damping;
        let mut converged = false;
        let mut iterations = 0;

        while iterations < self.max_iterations {
            if cost == 0.0 {
                converged = true;
                break;
            }
            iterations += 1;

            let j = problem.jacobian(&x)?;
            let jtj = j.transpose() * &j;
            let neg_grad = -(j.transpose() * &r);
            if neg_grad.amax() == 0.0 {
                converged = true;
                break;
            }

            let mut accepted = None;
            while lambda <= MAX_DAMPING {
                let mut damped = jtj.clone();
                for i in 0..damped.nrows() {
                    damped[(i, i)] += lambda * jtj[(i, i)].max(MIN_DAMPING);
                }

                let Some(chol) = damped.cholesky() else {
                    lambda *= 10.0;
                    continue;
                };
                let step = chol.solve(&neg_grad);
                let x_new = &x + &step;
                let r_new = problem.apply(&x_new)?;
                let cost_new = half_squared_norm(&r_new);

                if cost_new.is_finite() && cost_new < cost {
                    lambda = (lambda / 10.0).max(MIN_DAMPING);
                    accepted = Some((step, x_new, r_new, cost_new));
                    break;
                }
                lambda *= 10.0;
            }

            let Some((step, x_new, r_new, cost_new)) = accepted else {
                // No damping level reduces the cost any further.
                trace!("levenberg-marquardt stalled at cost {cost:e} after {iterations} iterations");
                converged = true;
                break;
            };

            let small_step = step.norm() <= self.tolerance * (x.norm() + self.tolerance);
            x = x_new;
            r = r_new;
            cost = cost_new;
            if small_step {
                converged = true;
                break;
            }
        }

        Ok(LmReport {
            params: x,
            cost,
            iterations,
            converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Rosenbrock written as residuals `(1 - x, 10 (y - x^2))`.
    struct Rosenbrock;

    impl Operator for Rosenbrock {
        type Param = DVector<f64>;
        type Output = DVector<f64>;

        fn apply(&self, p: &Self::Param) -> Result<Self::Output, Error> {
            Ok(DVector::from_vec(vec![1.0 - p[0], 10.0 * (p[1] - p[0] * p[0])]))
        }
    }

    impl Jacobian for Rosenbrock {
        type Param = DVector<f64>;
        type Jacobian = DMatrix<f64>;

        fn jacobian(&self, p: &Self::Param) -> Result<Self::Jacobian, Error> {
            Ok(DMatrix::from_row_slice(2, 2, &[-1.0, 0.0, -20.0 * p[0], 10.0]))
        }
    }

    #[test]
    fn solves_rosenbrock() {
        let report = LevenbergMarquardt::default()
            .minimize(&Rosenbrock, DVector::from_vec(vec![-1.2, 1.0]))
            .unwrap();
        assert!(report.converged);
        assert_relative_eq!(report.params[0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(report.params[1], 1.0, epsilon = 1e-8);
        assert!(report.cost < 1e-16);
    }

    #[test]
    fn starting_at_the_minimum_needs_no_iterations() {
        let report = LevenbergMarquardt::default()
            .minimize(&Rosenbrock, DVector::from_vec(vec![1.0, 1.0]))
            .unwrap();
        assert!(report.converged);
        assert_eq!(report.iterations, 0);
    }

    #[test]
    fn respects_iteration_cap() {
        let lm = LevenbergMarquardt {
            max_iterations: 1,
            ..LevenbergMarquardt::default()
        };
        let report = lm
            .minimize(&Rosenbrock, DVector::from_vec(vec![-1.2, 1.0]))
            .unwrap();
        assert_eq!(report.iterations, 1);
        assert!(!report.converged);
    }
}
