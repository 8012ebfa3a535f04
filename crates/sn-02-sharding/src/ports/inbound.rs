//! # Inbound Ports
//!
//! Shard mapping API plus a scriptable mock for tests.

use std::collections::HashMap;

use parking_lot::RwLock;
use shared_types::{Address, ShardId};

use crate::domain::communication_identifier;
use crate::domain::errors::ShardingResult;

/// Address to shard mapping.
pub trait ShardCoordinator: Send + Sync {
    /// Configured shard count (metachain excluded).
    fn number_of_shards(&self) -> u32;

    /// Shard this node belongs to.
    fn self_id(&self) -> ShardId;

    /// Shard owning `address`.
    fn compute_id(&self, address: &Address) -> ShardId;

    /// Topic suffix for traffic between this shard and `dest_shard_id`.
    fn communication_identifier(&self, dest_shard_id: ShardId) -> String;

    /// Returns true if both addresses live in the same shard.
    fn same_shard(&self, first: &Address, second: &Address) -> bool {
        self.compute_id(first) == self.compute_id(second)
    }
}

/// Public key bytes to address conversion.
pub trait AddressConverter: Send + Sync {
    /// Validate and wrap public key bytes.
    fn create_address(&self, pub_key: &[u8]) -> ShardingResult<Address>;

    /// Expected address length.
    fn address_len(&self) -> usize;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Coordinator with an explicit address table; unknown addresses map to self.
pub struct MockShardCoordinator {
    /// Shard count reported.
    pub number_of_shards: u32,
    /// Self shard.
    pub self_id: ShardId,
    assignments: RwLock<HashMap<Address, ShardId>>,
}

impl MockShardCoordinator {
    /// Create a mock.
    pub fn new(number_of_shards: u32, self_id: ShardId) -> Self {
        Self {
            number_of_shards,
            self_id,
            assignments: RwLock::new(HashMap::new()),
        }
    }

    /// Pin an address to a shard.
    pub fn assign(&self, address: &[u8], shard_id: ShardId) {
        self.assignments
            .write()
            .insert(Address::new(address.to_vec()), shard_id);
    }
}

impl ShardCoordinator for MockShardCoordinator {
    fn number_of_shards(&self) -> u32 {
        self.number_of_shards
    }

    fn self_id(&self) -> ShardId {
        self.self_id
    }

    fn compute_id(&self, address: &Address) -> ShardId {
        self.assignments
            .read()
            .get(address)
            .copied()
            .unwrap_or(self.self_id)
    }

    fn communication_identifier(&self, dest_shard_id: ShardId) -> String {
        communication_identifier(self.self_id, dest_shard_id)
    }
}
