//! # Node Runtime Library
//!
//! Wires the sharded node core into a running shard node. The `main.rs`
//! binary starts one node; the modules are exposed for integration tests.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration and component construction
//! - `genesis/` - Genesis headers and initial balances
//! - `wiring/` - Network interceptors and the round driver
//! - `runtime` - Task lifecycle of a running node

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::type_complexity)]

pub mod container;
pub mod genesis;
pub mod runtime;
pub mod wiring;

// Re-exports
pub use container::{ConfigError, NodeComponents, NodeConfig};
pub use genesis::{GenesisBlocks, GenesisBuilder, GenesisConfig, GenesisError};
pub use runtime::NodeRuntime;
pub use wiring::{run_round_loop, InterceptorWiring, RoundDriver};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
