//! Core alignment traits and the RANSAC driver.
//!
//! The pipeline is split into small pieces so that each can be swapped:
//! - [`Estimator`]: candidate model from a pair of minimal samples
//! - [`ScaleEstimator`]: per-axis scale from a pair of triplets
//! - [`Sampler`]: index selection for minimal samples
//! - [`Scoring`]: quality of a transformed source cloud against the target
//!
//! [`RansacAligner`] wires them together. Every iteration is an independent
//! work item whose samples come from a generator seeded with
//! `base_seed + iteration`, so iterations can be evaluated in parallel batches
//! and reduced in iteration order without changing the result.

use std::ops::Range;

use log::{debug, trace};
use nalgebra::Matrix3;
use rand::Rng;

use crate::error::{AlignmentError, Result};
use crate::models::{AlignmentResult, RigidTransform};
use crate::samplers::UniformRandomSampler;
use crate::scoring::Score;
use crate::settings::AlignmentSettings;
use crate::types::{Point, PointCloud};

/// Estimator generating a candidate model from two unpaired minimal samples.
pub trait Estimator {
    /// Model type produced by this estimator.
    type Model: Clone;

    /// Size of a minimal sample drawn from each cloud.
    fn sample_size(&self) -> usize;

    /// Estimate a model mapping `source[i]` onto `target[i]`.
    fn estimate_model(&self, source: &[Point], target: &[Point]) -> Result<Self::Model>;
}

/// Anisotropic scale estimation from paired triplets.
pub trait ScaleEstimator {
    /// Diagonal scale `S` such that the target triplet is `S * R * source + T`
    /// for some rotation `R` and translation `T`.
    fn estimate_scale(&self, source: &[Point], target: &[Point]) -> Result<Matrix3<f64>>;
}

/// Sampler responsible for drawing minimal samples from a cloud.
pub trait Sampler {
    /// Draw `sample_size` distinct indices into `out_indices`.
    ///
    /// Returns `false` if a valid sample could not be drawn.
    fn sample(&mut self, points: &[Point], sample_size: usize, out_indices: &mut [usize]) -> bool;

    /// Draw `n` distinct indices, returning every index in order when `n`
    /// covers the whole cloud.
    fn draw(&mut self, points: &[Point], n: usize) -> Result<Vec<usize>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        if points.is_empty() {
            return Err(AlignmentError::InvalidArgument(format!(
                "cannot sample {n} indices from an empty cloud"
            )));
        }
        if n >= points.len() {
            return Ok((0..points.len()).collect());
        }

        let mut indices = vec![0usize; n];
        if !self.sample(points, n, &mut indices) {
            return Err(AlignmentError::DegenerateSample("sampler could not draw a sample"));
        }
        Ok(indices)
    }
}

/// Scoring strategy evaluating a transformed source cloud against the target.
pub trait Scoring {
    /// Inlier threshold in the scorer's own units.
    fn threshold(&self) -> f64;

    fn score(&self, transformed_source: &[Point], target: &[Point]) -> Score;
}

/// Runs batches of independent work items, in parallel when a pool is available.
pub struct Executor {
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl Executor {
    /// `num_workers == 1` runs in-line; `0` uses rayon's default thread count.
    #[cfg(feature = "parallel")]
    pub fn new(num_workers: usize) -> Result<Self> {
        if num_workers == 1 {
            return Ok(Self { pool: None });
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .build()
            .map_err(|e| AlignmentError::WorkerPool(e.to_string()))?;
        Ok(Self { pool: Some(pool) })
    }

    #[cfg(not(feature = "parallel"))]
    pub fn new(_num_workers: usize) -> Result<Self> {
        Ok(Self {})
    }

    #[cfg(feature = "parallel")]
    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    #[cfg(not(feature = "parallel"))]
    pub fn is_parallel(&self) -> bool {
        false
    }

    /// Evaluate `f` over `range`, returning results in index order.
    #[cfg(feature = "parallel")]
    pub fn map<T, F>(&self, range: Range<usize>, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        use rayon::prelude::*;

        match &self.pool {
            Some(pool) => pool.install(|| range.into_par_iter().map(&f).collect()),
            None => range.map(f).collect(),
        }
    }

    #[cfg(not(feature = "parallel"))]
    pub fn map<T, F>(&self, range: Range<usize>, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        range.map(f).collect()
    }
}

/// RANSAC alignment of two point clouds without known correspondences.
pub struct RansacAligner<E, Sc>
where
    E: Estimator<Model = RigidTransform>,
    Sc: Scoring,
{
    pub settings: AlignmentSettings,
    pub estimator: E,
    pub scoring: Sc,
}

impl<E, Sc> RansacAligner<E, Sc>
where
    E: Estimator<Model = RigidTransform> + Sync,
    Sc: Scoring + Sync,
{
    pub fn new(settings: AlignmentSettings, estimator: E, scoring: Sc) -> Self {
        Self {
            settings,
            estimator,
            scoring,
        }
    }

    fn check_cloud(&self, name: &str, cloud: &PointCloud) -> Result<()> {
        let needed = self.estimator.sample_size();
        if cloud.len() < needed {
            return Err(AlignmentError::InvalidArgument(format!(
                "{name} cloud needs at least {needed} points, got {}",
                cloud.len()
            )));
        }
        Ok(())
    }

    /// Sample, estimate and score a single iteration.
    pub fn evaluate_iteration(
        &self,
        iteration: usize,
        base_seed: u64,
        source: &PointCloud,
        target: &PointCloud,
    ) -> Result<(RigidTransform, Score)> {
        let sample_size = self.estimator.sample_size();
        let mut sampler = UniformRandomSampler::from_seed(base_seed.wrapping_add(iteration as u64));
        let source_idx = sampler.draw(source.points(), sample_size)?;
        let target_idx = sampler.draw(target.points(), sample_size)?;

        let model = self
            .estimator
            .estimate_model(&source.gather(&source_idx), &target.gather(&target_idx))?;

        let transformed: Vec<Point> = source.iter().map(|p| model.apply(p)).collect();
        let score = self.scoring.score(&transformed, target.points());
        Ok((model, score))
    }

    /// Run RANSAC and return the best alignment found.
    ///
    /// Fails only on invalid input or settings. When no iteration produces a
    /// candidate the result is the identity with zero inliers and an infinite
    /// error.
    pub fn run(&self, source: &PointCloud, target: &PointCloud) -> Result<AlignmentResult> {
        self.settings.validate()?;
        self.check_cloud("source", source)?;
        self.check_cloud("target", target)?;

        let max_iterations = self.settings.max_iterations();
        let early_exit = self.settings.early_exit_inliers(source.len());
        let rule = self.settings.acceptance;
        let base_seed = self
            .settings
            .random_seed
            .unwrap_or_else(|| rand::thread_rng().gen());

        let executor = Executor::new(self.settings.num_workers)?;
        let batch_size = if executor.is_parallel() {
            self.settings.batch_size
        } else {
            1
        };
        debug!(
            "aligning {} source to {} target points: seed {base_seed}, budget {max_iterations}, threshold {:e}, early exit at {early_exit} inliers",
            source.len(),
            target.len(),
            self.scoring.threshold()
        );

        let mut best_transform = RigidTransform::identity();
        let mut best_score = Score::worst();
        let mut iterations = 0;
        let mut skipped = 0;

        'batches: while iterations < max_iterations {
            let end = (iterations + batch_size).min(max_iterations);
            let batch = executor.map(iterations..end, |i| {
                self.evaluate_iteration(i, base_seed, source, target)
            });

            for candidate in batch {
                let iteration = iterations;
                iterations += 1;

                let (transform, score) = match candidate {
                    Ok(c) => c,
                    Err(e) => {
                        trace!("iteration {iteration} skipped: {e}");
                        skipped += 1;
                        continue;
                    }
                };

                if score.replaces(&best_score, rule) {
                    trace!(
                        "iteration {iteration}: new best with {} inliers, error {:e}",
                        score.inlier_count,
                        score.total_error
                    );
                    best_transform = transform;
                    best_score = score;
                    if best_score.inlier_count >= early_exit {
                        break 'batches;
                    }
                }
            }
        }

        debug!(
            "alignment finished after {iterations} iterations ({skipped} skipped): {} inliers, error {:e}",
            best_score.inlier_count,
            best_score.total_error
        );

        Ok(AlignmentResult {
            transform: best_transform,
            inlier_count: best_score.inlier_count,
            total_error: best_score.total_error,
            iterations,
        })
    }
}
