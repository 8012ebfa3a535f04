//! # Ports
//!
//! Sharding API consumed by every other component.

pub mod inbound;

pub use inbound::{AddressConverter, MockShardCoordinator, ShardCoordinator};
