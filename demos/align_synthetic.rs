//! Example: aligning a synthetic point cloud pair
//!
//! Generates a shuffled cloud and its rotated, translated and scaled copy,
//! then recovers the transform with and without scale estimation.
//!
//! Run with `RUST_LOG=debug` to see the driver's progress.

use cloud_align::synthetic::generate_point_cloud_pair;
use cloud_align::utils::rotation_from_euler_degrees;
use cloud_align::{align_point_clouds, AlignmentSettings, RigidTransform};
use nalgebra::{Matrix3, Vector3};

fn format_vector(v: &Vector3<f64>) -> String {
    format!("[{:.2}, {:.2}, {:.2}]", v.x, v.y, v.z)
}

fn format_matrix(m: &Matrix3<f64>) -> String {
    m.row_iter()
        .map(|r| format!("|{:.2}, {:.2}, {:.2}|", r[0], r[1], r[2]))
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_transform(t: &RigidTransform, with_scale: bool) {
    println!("Translation:\n {}", format_vector(&t.translation));
    println!("Rotation:\n{}", format_matrix(&t.rotation));
    if with_scale {
        println!("Scale:\n{}", format_matrix(&t.scale));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== Point Cloud Alignment Example ===\n");

    let unscaled = RigidTransform::new(
        rotation_from_euler_degrees(90.0, 0.0, 0.0),
        Vector3::new(30.0, 40.0, 10.0),
    );
    let (source, target) = generate_point_cloud_pair(25, &unscaled, 42, true);

    println!("Ground truth (25 points, shuffled):");
    print_transform(&unscaled, false);

    let settings = AlignmentSettings {
        inlier_threshold: 1e-3,
        random_seed: Some(7),
        ..AlignmentSettings::default()
    };
    let result = align_point_clouds(&source, &target, Some(settings))?;
    println!(
        "\nBest inliers: {}, Total Iterations: {}, Error: {:.2}",
        result.inlier_count, result.iterations, result.total_error
    );
    print_transform(&result.transform, false);

    let scaled = RigidTransform::with_scale(
        rotation_from_euler_degrees(0.0, 90.0, 0.0),
        Vector3::new(20.0, 40.0, 10.0),
        Matrix3::from_diagonal(&Vector3::new(2.0, 3.0, 1.0)),
    );
    let (source, target) = generate_point_cloud_pair(12, &scaled, 11, true);

    println!("\nGround truth with scale (12 points, shuffled):");
    print_transform(&scaled, true);

    let settings = AlignmentSettings {
        enable_scale: true,
        inlier_threshold: 1e-3,
        max_iterations_scaled: 20_000,
        random_seed: Some(7),
        ..AlignmentSettings::default()
    };
    let result = align_point_clouds(&source, &target, Some(settings))?;
    println!(
        "\nBest inliers: {}, Total Iterations: {}, Error: {:.2}",
        result.inlier_count, result.iterations, result.total_error
    );
    print_transform(&result.transform, true);

    Ok(())
}
