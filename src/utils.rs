//! Miscellaneous utilities shared across the crate.
//!
//! - [`UniformRandomGenerator`]: a seeded uniform integer generator with
//!   unique-set sampling, used by the samplers.
//! - [`gauss_elimination`]: small dense solver used by the scale estimators.
//! - [`rotation_from_euler_degrees`]: rotation helper for tests and demos.

use nalgebra::{Matrix3, Rotation3, Vector3};
use rand::distributions::uniform::SampleUniform;
use rand::distributions::Uniform;
use rand::prelude::*;

/// Uniform integer random-number generator.
///
/// By default this uses an entropy-seeded RNG; alignment runs always build it
/// from an explicit seed so that results are reproducible.
pub struct UniformRandomGenerator<T>
where
    T: Copy + SampleUniform + PartialOrd,
{
    rng: StdRng,
    dist: Option<Uniform<T>>,
}

impl<T> Default for UniformRandomGenerator<T>
where
    T: Copy + SampleUniform + PartialOrd,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> UniformRandomGenerator<T>
where
    T: Copy + SampleUniform + PartialOrd,
{
    /// Construct with an entropy seed.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            dist: None,
        }
    }

    /// Construct with a fixed seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            dist: None,
        }
    }

    /// Reset the distribution range to `[min, max]`.
    pub fn reset(&mut self, min: T, max: T) {
        self.dist = Some(Uniform::new_inclusive(min, max));
    }

    /// Draw a single value from the current range, or `None` before [`reset`](Self::reset).
    pub fn next(&mut self) -> Option<T> {
        let dist = self.dist.as_ref()?;
        Some(self.rng.sample(dist))
    }

    /// Fill `out` with distinct values drawn uniformly from `[min, max]`.
    ///
    /// Rejection sampling; meant for small sets such as minimal samples. The
    /// caller must make sure the range holds at least `out.len()` values.
    pub fn gen_unique(&mut self, out: &mut [T], min: T, max: T)
    where
        T: Eq,
    {
        let dist = Uniform::new_inclusive(min, max);
        for i in 0..out.len() {
            loop {
                let candidate = self.rng.sample(&dist);
                if out[..i].iter().all(|&v| v != candidate) {
                    out[i] = candidate;
                    break;
                }
            }
        }
        self.dist = Some(dist);
    }

    /// Access the underlying RNG, e.g. for shuffling.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

/// Gaussian elimination with partial pivoting solving `a * x = b` for a 3x3 system.
///
/// Returns `None` when a pivot falls below `1e-10` times the largest absolute
/// entry of `a`, i.e. when the system is numerically singular.
pub fn gauss_elimination(a: &Matrix3<f64>, b: &Vector3<f64>) -> Option<Vector3<f64>> {
    const N: usize = 3;
    let scale = a.amax();
    if !scale.is_finite() || scale == 0.0 || !b.iter().all(|v| v.is_finite()) {
        return None;
    }
    let tolerance = 1e-10 * scale;

    let mut m = *a;
    let mut rhs = *b;

    for i in 0..N {
        // Pivotisation: row with the largest pivot element
        let mut max_row = i;
        for k in (i + 1)..N {
            if m[(k, i)].abs() > m[(max_row, i)].abs() {
                max_row = k;
            }
        }
        if max_row != i {
            m.swap_rows(i, max_row);
            rhs.swap_rows(i, max_row);
        }

        if m[(i, i)].abs() < tolerance {
            return None;
        }

        for k in (i + 1)..N {
            let factor = m[(k, i)] / m[(i, i)];
            for j in i..N {
                m[(k, j)] -= factor * m[(i, j)];
            }
            rhs[k] -= factor * rhs[i];
        }
    }

    // Back-substitution
    let mut x = Vector3::zeros();
    for i in (0..N).rev() {
        let mut acc = rhs[i];
        for j in (i + 1)..N {
            acc -= m[(i, j)] * x[j];
        }
        x[i] = acc / m[(i, i)];
    }

    Some(x)
}

/// Rotation built from Euler angles in degrees, composed as `Rz * Ry * Rx`.
pub fn rotation_from_euler_degrees(x_deg: f64, y_deg: f64, z_deg: f64) -> Matrix3<f64> {
    Rotation3::from_euler_angles(x_deg.to_radians(), y_deg.to_radians(), z_deg.to_radians())
        .into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_samples_within_bounds() {
        let mut rng = UniformRandomGenerator::<u32>::from_seed(1234);
        let mut buf = [0u32; 5];
        rng.gen_unique(&mut buf, 0, 10);

        assert!(buf.iter().all(|&v| v <= 10));
        for i in 0..buf.len() {
            for j in (i + 1)..buf.len() {
                assert_ne!(buf[i], buf[j]);
            }
        }
    }

    #[test]
    fn deterministic_with_same_seed() {
        let mut rng1 = UniformRandomGenerator::<u32>::from_seed(42);
        let mut rng2 = UniformRandomGenerator::<u32>::from_seed(42);

        rng1.reset(0, 100);
        rng2.reset(0, 100);

        let a1: Vec<u32> = (0..10).filter_map(|_| rng1.next()).collect();
        let a2: Vec<u32> = (0..10).filter_map(|_| rng2.next()).collect();

        assert_eq!(a1.len(), 10);
        assert_eq!(a1, a2);
    }

    #[test]
    fn next_without_range_is_none() {
        let mut rng = UniformRandomGenerator::<usize>::from_seed(0);
        assert!(rng.next().is_none());
    }

    #[test]
    fn gauss_elimination_solves_and_detects_singularity() {
        let a = Matrix3::new(0.0, 2.0, 1.0, 1.0, 1.0, 0.0, 3.0, 0.0, 1.0);
        let x_true = Vector3::new(1.0, -2.0, 0.5);
        let x = gauss_elimination(&a, &(a * x_true)).unwrap();
        assert!((x - x_true).norm() < 1e-12);

        let singular = Matrix3::new(1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 1.0, 1.0);
        assert!(gauss_elimination(&singular, &Vector3::new(1.0, 2.0, 3.0)).is_none());
        assert!(gauss_elimination(&Matrix3::zeros(), &Vector3::zeros()).is_none());
    }

    #[test]
    fn euler_rotation_about_y() {
        let r = rotation_from_euler_degrees(0.0, 90.0, 0.0);
        let expected = Matrix3::new(0.0, 0.0, 1.0, 0.0, 1.0, 0.0, -1.0, 0.0, 0.0);
        assert!((r - expected).amax() < 1e-12);
        assert!((r.determinant() - 1.0).abs() < 1e-12);
    }
}
