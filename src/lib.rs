//! # cloud-align - RANSAC alignment of 3D point clouds
//!
//! `cloud-align` estimates the rotation, translation and optional per-axis
//! scale that map one 3D point cloud onto another when the point-to-point
//! correspondence is unknown. Candidates come from pairs of random triplets
//! (Kabsch, plus an anisotropic scale fit when enabled) and are scored by how
//! many transformed source points land next to a target point.
//!
//! ## Quick Start
//!
//! ```rust
//! use cloud_align::{align_point_clouds, AlignmentSettings, PointCloud};
//!
//! let source = PointCloud::from_rows(&[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [0.0, 3.0, 1.0]]);
//! let target = PointCloud::from_rows(&[[1.0, 1.0, 1.0], [5.0, 1.0, 1.0], [1.0, 4.0, 2.0]]);
//!
//! let settings = AlignmentSettings::default().with_seed(42);
//! let result = align_point_clouds(&source, &target, Some(settings)).unwrap();
//! println!("Found {} inliers", result.inlier_count);
//! ```
//!
//! ## Extending the Library
//!
//! [`RansacAligner`](core::RansacAligner) is generic over its components:
//!
//! - **[`Estimator`](core::Estimator)**: candidate model from two minimal samples
//! - **[`ScaleEstimator`](core::ScaleEstimator)**: per-axis scale from two triplets;
//!   plug a custom one in through [`ScaleEstimatorChoice::Dyn`](choices::ScaleEstimatorChoice::Dyn)
//! - **[`Sampler`](core::Sampler)**: index selection
//! - **[`Scoring`](core::Scoring)**: candidate quality
//!
//! ## Modules
//!
//! - **[`api`]**: [`align_point_clouds`], the high-level entry point
//! - **[`core`]**: traits, the parallel executor and the RANSAC driver
//! - **[`estimators`]**: Kabsch and the scale estimators
//! - **[`least_squares`]**: Levenberg-Marquardt on argmin problem traits
//! - **[`samplers`]**: seeded uniform sampling
//! - **[`scoring`]**: nearest-neighbour inlier scoring
//! - **[`models`]**: transform and result types
//! - **[`settings`]**: configuration
//! - **[`synthetic`]**: seeded test clouds

pub mod api;
pub mod choices;
pub mod core;
pub mod error;
pub mod estimators;
pub mod least_squares;
pub mod models;
pub mod samplers;
pub mod scoring;
pub mod settings;
pub mod synthetic;
pub mod types;
pub mod utils;

// Re-export high-level API
pub use api::align_point_clouds;

// Re-export core traits for easy access
pub use core::{Estimator, RansacAligner, Sampler, ScaleEstimator, Scoring};

pub use error::{AlignmentError, Result};
pub use models::{AlignmentResult, RigidTransform};
pub use settings::{AcceptanceRule, AlignmentSettings, ScaleEstimatorType, ScaleRefinementSettings};
pub use types::{Point, PointCloud};
