//! # Node Container
//!
//! Configuration and the fully wired components of one shard node.
//!
//! Components are built in dependency order (Level 0 → Level 4) and held
//! behind `Arc`s so the round loop, the broadcast worker and the network
//! handlers share one instance of each.

pub mod components;
pub mod config;

pub use components::NodeComponents;
pub use config::{
    ChronologyConfig, ConfigError, NetworkConfig, NodeConfig, ProcessingConfig, ShardingConfig,
};
