//! Synthetic point cloud pairs for tests and demos.

use rand::seq::SliceRandom;

use crate::models::RigidTransform;
use crate::types::{Point, PointCloud};
use crate::utils::UniformRandomGenerator;

/// Coordinates are integers drawn from `[0, COORD_MAX)`.
pub const COORD_MAX: i32 = 15;

/// Generate `size` random points and their image under `transform`.
///
/// Coordinates are integers in `[0, 15)` drawn from a generator seeded with
/// `seed`. With `shuffle`, both clouds are shuffled independently, so the
/// index correspondence between them is lost.
pub fn generate_point_cloud_pair(
    size: usize,
    transform: &RigidTransform,
    seed: u64,
    shuffle: bool,
) -> (PointCloud, PointCloud) {
    let mut rng = UniformRandomGenerator::<i32>::from_seed(seed);
    rng.reset(0, COORD_MAX - 1);

    let mut source = Vec::with_capacity(size);
    let mut target = Vec::with_capacity(size);
    for _ in 0..size {
        let mut coords = [0.0; 3];
        for c in coords.iter_mut() {
            *c = rng.next().unwrap_or_default() as f64;
        }
        let p = Point::from(coords);
        source.push(p);
        target.push(transform.apply(&p));
    }

    if shuffle {
        source.shuffle(rng.rng_mut());
        target.shuffle(rng.rng_mut());
    }

    (PointCloud::new(source), PointCloud::new(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::rotation_from_euler_degrees;
    use nalgebra::Vector3;

    fn transform() -> RigidTransform {
        RigidTransform::new(
            rotation_from_euler_degrees(90.0, 0.0, 0.0),
            Vector3::new(30.0, 40.0, 10.0),
        )
    }

    #[test]
    fn target_is_transformed_source() {
        let t = transform();
        let (source, target) = generate_point_cloud_pair(25, &t, 42, false);
        assert_eq!(source.len(), 25);
        assert_eq!(target.len(), 25);
        for (p, q) in source.iter().zip(&target) {
            assert!((t.apply(p) - q).norm() < 1e-12);
            assert!(p.iter().all(|&c| (0.0..15.0).contains(&c) && c.fract() == 0.0));
        }
    }

    #[test]
    fn same_seed_same_clouds() {
        let t = transform();
        assert_eq!(
            generate_point_cloud_pair(10, &t, 7, true),
            generate_point_cloud_pair(10, &t, 7, true)
        );
        assert_ne!(
            generate_point_cloud_pair(10, &t, 7, false).0,
            generate_point_cloud_pair(10, &t, 8, false).0
        );
    }

    #[test]
    fn shuffling_keeps_the_point_sets() {
        let t = transform();
        let (plain_src, plain_dst) = generate_point_cloud_pair(20, &t, 3, false);
        let (mut src, mut dst) = (
            generate_point_cloud_pair(20, &t, 3, true).0.into_points(),
            generate_point_cloud_pair(20, &t, 3, true).1.into_points(),
        );

        let key = |p: &Point| (p.x.to_bits(), p.y.to_bits(), p.z.to_bits());
        let mut expected_src = plain_src.into_points();
        let mut expected_dst = plain_dst.into_points();
        for v in [&mut src, &mut dst, &mut expected_src, &mut expected_dst] {
            v.sort_by_key(key);
        }
        assert_eq!(src, expected_src);
        assert_eq!(dst, expected_dst);
    }
}
