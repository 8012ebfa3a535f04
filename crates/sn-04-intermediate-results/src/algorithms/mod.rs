//! # Algorithms
//!
//! Deterministic mini-block packaging.

pub mod packaging;

pub use packaging::build_cross_shard_mini_blocks;
