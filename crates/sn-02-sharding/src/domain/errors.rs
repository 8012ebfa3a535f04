//! # Domain Errors
//!
//! Error types for the sharding component.

use shared_types::ShardId;
use thiserror::Error;

/// Sharding result alias.
pub type ShardingResult<T> = Result<T, ShardingError>;

/// Sharding error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShardingError {
    /// A coordinator needs at least one shard.
    #[error("Invalid number of shards: {0}")]
    InvalidNumberOfShards(u32),

    /// Self shard outside the configured range.
    #[error("Invalid shard id {shard_id} for {number_of_shards} shards")]
    InvalidShardId {
        /// Offending shard id
        shard_id: ShardId,
        /// Configured shard count
        number_of_shards: u32,
    },

    /// Address bytes of the wrong length.
    #[error("Wrong address length: expected {expected}, got {got}")]
    WrongAddressLength {
        /// Configured length
        expected: usize,
        /// Received length
        got: usize,
    },

    /// Address with no bytes.
    #[error("Empty address")]
    EmptyAddress,
}
