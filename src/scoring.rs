//! Inlier scoring for candidate alignments.
//!
//! A candidate is scored by transforming the whole source cloud and looking up,
//! for every transformed point, the closest target point by brute force. The
//! resulting [`Score`] carries the inlier count and the summed squared
//! nearest-neighbour distance.

use crate::core::Scoring;
use crate::settings::AcceptanceRule;
use crate::types::Point;

/// Inlier count and total squared error of a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub inlier_count: usize,
    pub total_error: f64,
}

impl Score {
    pub fn new(inlier_count: usize, total_error: f64) -> Self {
        Self {
            inlier_count,
            total_error,
        }
    }

    /// Score of the identity fallback before any candidate has been accepted.
    pub fn worst() -> Self {
        Self::new(0, f64::INFINITY)
    }

    /// Whether `self` should replace `best` under `rule`.
    pub fn replaces(&self, best: &Score, rule: AcceptanceRule) -> bool {
        match rule {
            AcceptanceRule::InliersOrError => {
                self.inlier_count > best.inlier_count || self.total_error < best.total_error
            }
            AcceptanceRule::Lexicographic => {
                self.inlier_count > best.inlier_count
                    || (self.inlier_count == best.inlier_count
                        && self.total_error < best.total_error)
            }
        }
    }
}

/// Squared distance from `p` to its nearest point in `target`.
///
/// Returns `f64::INFINITY` for an empty target.
pub fn nearest_squared_distance(p: &Point, target: &[Point]) -> f64 {
    target
        .iter()
        .map(|q| (q - p).norm_squared())
        .fold(f64::INFINITY, f64::min)
}

/// Brute-force nearest-neighbour scoring against the target cloud.
///
/// `threshold` is compared to *squared* distances: a point counts as an inlier
/// when its nearest squared distance is strictly below it.
#[derive(Debug, Clone, Copy)]
pub struct NearestNeighborScoring {
    threshold: f64,
}

impl NearestNeighborScoring {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Scoring for NearestNeighborScoring {
    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn score(&self, transformed_source: &[Point], target: &[Point]) -> Score {
        let mut inlier_count = 0usize;
        let mut total_error = 0.0;
        for p in transformed_source {
            let d2 = nearest_squared_distance(p, target);
            if d2 < self.threshold {
                inlier_count += 1;
            }
            total_error += d2;
        }
        Score::new(inlier_count, total_error)
    }
}
