//! # Algorithms
//!
//! Pure shard mapping functions.

pub mod shard_mapping;

pub use shard_mapping::{compute_masks, map_address_to_shard, ShardMasks};
