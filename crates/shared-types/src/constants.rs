//! # Protocol Constants
//!
//! Limits and finality thresholds shared across components.

use crate::entities::ShardId;

/// Shard id reserved for the metachain.
pub const METACHAIN_SHARD_ID: ShardId = u32::MAX;

/// Headers that must chain on a shard header before it is considered final.
pub const SHARD_BLOCK_FINALITY: u64 = 1;

/// Headers that must chain on a metachain header before it is considered final.
pub const META_BLOCK_FINALITY: u64 = 1;

/// Consecutive processed headers needed to finalize a fork-detector checkpoint.
pub const FORK_BLOCK_FINALITY: u64 = 1;

/// Maximum header requests issued in one call.
pub const MAX_HEADER_REQUESTS_ALLOWED: usize = 10;

/// Maximum items (transactions and results) in one block.
pub const MAX_ITEMS_IN_BLOCK: usize = 15_000;

/// Maximum gas accumulated in one mini-block.
pub const MAX_GAS_LIMIT_PER_MINI_BLOCK: u64 = 100_000;

/// Consecutive data-request timeouts tolerated for one header.
pub const MAX_REQUESTS_WITH_TIMEOUT_ALLOWED: u32 = 5;

/// Entries one pool store accepts before refusing new data.
pub const DEFAULT_POOL_CAPACITY: usize = 100_000;

/// Maximum packet size used when broadcasting transaction batches.
pub const MAX_BULK_TRANSACTION_SIZE: usize = 1 << 18;

/// Rounds without a new header after which the probable highest nonce is reset.
pub const MAX_ROUNDS_TO_WAIT: i64 = 5;
