//! Core shared types: points and point clouds.
//!
//! Points are plain `nalgebra` values. A [`PointCloud`] is an ordered list of
//! points whose order is only used for indexing inside a single run.

use nalgebra::{Point3, Vector3};

use crate::models::RigidTransform;

/// A 3D point with `f64` coordinates.
pub type Point = Point3<f64>;

/// Ordered collection of 3D points.
///
/// The cloud is owned by the caller; the alignment code only reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    points: Vec<Point>,
}

impl PointCloud {
    /// Wrap an existing vector of points.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Build a cloud from `[x, y, z]` rows.
    pub fn from_rows(rows: &[[f64; 3]]) -> Self {
        rows.iter().map(|r| Point::new(r[0], r[1], r[2])).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    /// Copy the points at `indices`, in the order given.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    pub fn gather(&self, indices: &[usize]) -> Vec<Point> {
        indices.iter().map(|&i| self.points[i]).collect()
    }

    /// Mean of all points, or `None` for an empty cloud.
    pub fn centroid(&self) -> Option<Point> {
        centroid(&self.points)
    }

    /// Apply `transform` to every point, returning a new cloud.
    pub fn transformed(&self, transform: &RigidTransform) -> PointCloud {
        self.points.iter().map(|p| transform.apply(p)).collect()
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }
}

impl From<Vec<Point>> for PointCloud {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<Point> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Mean of a slice of points, or `None` when the slice is empty.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::<f64>::zeros(), |acc, p| acc + p.coords);
    Some(Point::from(sum / points.len() as f64))
}
