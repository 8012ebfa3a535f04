//! # SN-02 Sharding
//!
//! Deterministic mapping of account addresses to shards.
//!
//! **Component ID:** 2
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Map every address to exactly one shard using trailing-byte masks
//! - Name the communication channel between two shards (topic suffix)
//! - Validate public key bytes before they become addresses
//!
//! ## Module Structure
//!
//! ```text
//! sn-02-sharding/
//! ├── domain/          # MultiShardCoordinator, PlainAddressConverter, errors
//! ├── algorithms/      # Mask computation and mapping
//! └── ports/           # ShardCoordinator + AddressConverter traits
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;
pub mod ports;

// Re-exports
pub use algorithms::{compute_masks, map_address_to_shard, ShardMasks};
pub use domain::{
    communication_identifier, MultiShardCoordinator, PlainAddressConverter, ShardingError,
    ShardingResult,
};
pub use ports::{AddressConverter, MockShardCoordinator, ShardCoordinator};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
