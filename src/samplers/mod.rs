//! Sampling strategies for minimal samples.
//!
//! Samplers implement the shared [`Sampler`](crate::core::Sampler) trait and
//! are always constructed from an explicit seed inside an alignment run.

pub mod uniform;

pub use uniform::UniformRandomSampler;
