//! # Multi Shard Coordinator
//!
//! Production `ShardCoordinator`: fixed shard count, one self shard.

use shared_types::{shard_label, Address, ShardId, METACHAIN_SHARD_ID};
use tracing::{debug, warn};

use crate::algorithms::{compute_masks, map_address_to_shard, ShardMasks};
use crate::domain::errors::{ShardingError, ShardingResult};
use crate::ports::ShardCoordinator;

/// Shard coordinator for a node living in `self_id`.
#[derive(Debug, Clone)]
pub struct MultiShardCoordinator {
    number_of_shards: u32,
    self_id: ShardId,
    masks: ShardMasks,
}

impl MultiShardCoordinator {
    /// Create a coordinator. The metachain id is accepted as `self_id`.
    pub fn new(number_of_shards: u32, self_id: ShardId) -> ShardingResult<Self> {
        if number_of_shards == 0 {
            warn!("[sn-02] Refusing coordinator with zero shards");
            return Err(ShardingError::InvalidNumberOfShards(number_of_shards));
        }
        if self_id >= number_of_shards && self_id != METACHAIN_SHARD_ID {
            warn!(
                "[sn-02] Self shard {} is outside {} shards",
                self_id, number_of_shards
            );
            return Err(ShardingError::InvalidShardId {
                shard_id: self_id,
                number_of_shards,
            });
        }

        let masks = compute_masks(number_of_shards);
        debug!(
            "[sn-02] Coordinator for shard {} of {} (masks {:#x}/{:#x})",
            shard_label(self_id),
            number_of_shards,
            masks.high,
            masks.low
        );
        Ok(Self {
            number_of_shards,
            self_id,
            masks,
        })
    }
}

impl ShardCoordinator for MultiShardCoordinator {
    fn number_of_shards(&self) -> u32 {
        self.number_of_shards
    }

    fn self_id(&self) -> ShardId {
        self.self_id
    }

    fn compute_id(&self, address: &Address) -> ShardId {
        map_address_to_shard(address.as_bytes(), self.number_of_shards, self.masks)
    }

    fn communication_identifier(&self, dest_shard_id: ShardId) -> String {
        communication_identifier(self.self_id, dest_shard_id)
    }
}

/// Topic suffix shared by `a` and `b`: `_A` if equal, else `_LOW_HIGH`.
pub fn communication_identifier(a: ShardId, b: ShardId) -> String {
    if a == b {
        return format!("_{}", shard_label(a));
    }
    let (low, high) = if a < b { (a, b) } else { (b, a) };
    format!("_{}_{}", shard_label(low), shard_label(high))
}
