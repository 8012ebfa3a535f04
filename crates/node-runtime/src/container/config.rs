//! # Node Configuration
//!
//! Unified configuration for one shard node and its round loop.
//!
//! Every section has a usable default; `main` layers `SN_*` environment
//! overrides on top and refuses to start on a configuration that fails
//! [`NodeConfig::validate`].

use std::time::Duration;

use shared_types::{
    ShardId, MAX_GAS_LIMIT_PER_MINI_BLOCK, MAX_ITEMS_IN_BLOCK, MAX_REQUESTS_WITH_TIMEOUT_ALLOWED,
};
use sn_05_block_processing::ProcessorConfig;
use sn_07_resolvers::BroadcastConfig;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Peer id on the network.
    pub node_name: String,
    /// Shard layout.
    pub sharding: ShardingConfig,
    /// Block building and processing limits.
    pub processing: ProcessingConfig,
    /// Outbound message settings.
    pub network: NetworkConfig,
    /// Round clock.
    pub chronology: ChronologyConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_name: "node-0".to_string(),
            sharding: ShardingConfig::default(),
            processing: ProcessingConfig::default(),
            network: NetworkConfig::default(),
            chronology: ChronologyConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Small, fast configuration for tests.
    pub fn for_testing(self_shard_id: ShardId) -> Self {
        Self {
            node_name: format!("test-node-{}", self_shard_id),
            sharding: ShardingConfig {
                number_of_shards: 2,
                self_shard_id,
                ..Default::default()
            },
            processing: ProcessingConfig {
                max_items_in_block: 100,
                scr_wait_ms: 50,
                ..Default::default()
            },
            network: NetworkConfig {
                broadcast_queue_capacity: 64,
            },
            chronology: ChronologyConfig {
                genesis_unix_secs: 0,
                round_duration_ms: 100,
            },
        }
    }

    /// Check that the sections fit together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sharding = &self.sharding;
        if sharding.number_of_shards == 0 {
            return Err(ConfigError::InvalidNumberOfShards);
        }
        if sharding.self_shard_id >= sharding.number_of_shards {
            return Err(ConfigError::InvalidSelfShard {
                self_shard_id: sharding.self_shard_id,
                number_of_shards: sharding.number_of_shards,
            });
        }
        if sharding.address_len == 0 {
            return Err(ConfigError::InvalidAddressLength);
        }
        if self.chronology.round_duration_ms == 0 {
            return Err(ConfigError::ZeroRoundDuration);
        }
        if self.network.broadcast_queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.processing.scr_wait_ms >= self.chronology.round_duration_ms {
            return Err(ConfigError::ResultWaitTooLong {
                scr_wait_ms: self.processing.scr_wait_ms,
                round_duration_ms: self.chronology.round_duration_ms,
            });
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Zero shards configured.
    #[error("Number of shards must be at least 1")]
    InvalidNumberOfShards,

    /// Self shard outside the configured range.
    #[error("Self shard {self_shard_id} is out of range for {number_of_shards} shards")]
    InvalidSelfShard {
        /// Configured self shard.
        self_shard_id: ShardId,
        /// Configured shard count.
        number_of_shards: u32,
    },

    /// Addresses cannot be empty.
    #[error("Address length must be positive")]
    InvalidAddressLength,

    /// Rounds cannot be zero length.
    #[error("Round duration must be positive")]
    ZeroRoundDuration,

    /// The broadcast queue needs room for at least one message.
    #[error("Broadcast queue capacity must be positive")]
    ZeroQueueCapacity,

    /// Waiting on results would eat the whole round.
    #[error("Result wait of {scr_wait_ms}ms does not fit a {round_duration_ms}ms round")]
    ResultWaitTooLong {
        /// Configured wait.
        scr_wait_ms: u64,
        /// Configured round length.
        round_duration_ms: u64,
    },
}

/// Shard layout.
#[derive(Debug, Clone)]
pub struct ShardingConfig {
    /// Number of regular shards.
    pub number_of_shards: u32,
    /// Shard this node belongs to.
    pub self_shard_id: ShardId,
    /// Address length in bytes.
    pub address_len: usize,
}

impl Default for ShardingConfig {
    fn default() -> Self {
        Self {
            number_of_shards: 1,
            self_shard_id: 0,
            address_len: 32,
        }
    }
}

/// Block building and processing limits.
#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    /// Maximum transactions and results in one block.
    pub max_items_in_block: usize,
    /// Maximum gas accumulated in one mini-block.
    pub max_gas_per_mini_block: u64,
    /// Consecutive timeouts tolerated before a header is dropped.
    pub max_requests_with_timeout: u32,
    /// Time budget for missing results while processing a block.
    pub scr_wait_ms: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_items_in_block: MAX_ITEMS_IN_BLOCK,
            max_gas_per_mini_block: MAX_GAS_LIMIT_PER_MINI_BLOCK,
            max_requests_with_timeout: MAX_REQUESTS_WITH_TIMEOUT_ALLOWED,
            scr_wait_ms: 1_000,
        }
    }
}

impl ProcessingConfig {
    /// Limits handed to the block processor.
    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            max_items_in_block: self.max_items_in_block,
            max_gas_per_mini_block: self.max_gas_per_mini_block,
            max_requests_with_timeout: self.max_requests_with_timeout,
        }
    }

    /// Result wait as a duration.
    pub fn scr_wait(&self) -> Duration {
        Duration::from_millis(self.scr_wait_ms)
    }
}

/// Outbound message settings.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Messages buffered before broadcasts are dropped.
    pub broadcast_queue_capacity: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            broadcast_queue_capacity: BroadcastConfig::default().queue_capacity,
        }
    }
}

impl NetworkConfig {
    /// Queue settings handed to the broadcaster.
    pub fn broadcast_config(&self) -> BroadcastConfig {
        BroadcastConfig {
            queue_capacity: self.broadcast_queue_capacity,
        }
    }
}

/// Round clock.
#[derive(Debug, Clone)]
pub struct ChronologyConfig {
    /// Unix time of round 0.
    pub genesis_unix_secs: u64,
    /// Length of one round.
    pub round_duration_ms: u64,
}

impl Default for ChronologyConfig {
    fn default() -> Self {
        Self {
            genesis_unix_secs: 0,
            round_duration_ms: 4_000,
        }
    }
}

impl ChronologyConfig {
    /// Round length as a duration.
    pub fn round_duration(&self) -> Duration {
        Duration::from_millis(self.round_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert_eq!(config.sharding.number_of_shards, 1);
        assert_eq!(config.processing.max_items_in_block, MAX_ITEMS_IN_BLOCK);
        assert_eq!(config.chronology.round_duration(), Duration::from_secs(4));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_testing_config_is_valid() {
        let config = NodeConfig::for_testing(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_sharding() {
        let mut config = NodeConfig::default();
        config.sharding.number_of_shards = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidNumberOfShards));

        let mut config = NodeConfig::default();
        config.sharding.self_shard_id = 3;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSelfShard { self_shard_id: 3, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_result_wait_longer_than_round() {
        let mut config = NodeConfig::default();
        config.processing.scr_wait_ms = config.chronology.round_duration_ms;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ResultWaitTooLong { .. })
        ));
    }
}
