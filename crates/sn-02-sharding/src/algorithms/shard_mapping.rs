//! # Shard Mapping Algorithm
//!
//! Deterministic address to shard mapping on the trailing address bytes.
//!
//! The trailing bytes are read big-endian and masked with the smallest
//! all-ones mask covering the shard count. Values that land past the last
//! shard are masked again with the next smaller mask, so every address maps
//! to a valid shard without any lookup table.

use shared_types::ShardId;

/// Masks derived from a shard count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardMasks {
    /// `2^ceil(log2(n)) - 1`
    pub high: u32,
    /// `2^(ceil(log2(n)) - 1) - 1`
    pub low: u32,
}

/// Compute the masks for `number_of_shards` (must be non-zero).
pub fn compute_masks(number_of_shards: u32) -> ShardMasks {
    let bits = if number_of_shards <= 1 {
        0
    } else {
        u32::BITS - (number_of_shards - 1).leading_zeros()
    };

    let high = if bits >= u32::BITS { u32::MAX } else { (1u32 << bits) - 1 };
    let low = if bits == 0 { 0 } else { (1u32 << (bits - 1)) - 1 };
    ShardMasks { high, low }
}

/// Map address bytes to a shard.
pub fn map_address_to_shard(address: &[u8], number_of_shards: u32, masks: ShardMasks) -> ShardId {
    if number_of_shards <= 1 {
        return 0;
    }

    let bytes_needed = (number_of_shards / 256) as usize + 1;
    let start = address.len().saturating_sub(bytes_needed);

    let value = address[start..]
        .iter()
        .fold(0u32, |acc, b| (acc << 8) + u32::from(*b));

    let shard = value & masks.high;
    if shard > number_of_shards - 1 {
        return value & masks.low;
    }
    shard
}
