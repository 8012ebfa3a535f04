//! # SN-04 Intermediate Results
//!
//! Cross-shard settlement of smart contract results.
//!
//! **Component ID:** 4
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - File results produced while executing a block, tagged by shard pair
//! - Package results for other shards into sorted, reproducible mini-blocks
//! - Verify proposed result mini-blocks against the locally computed ones
//! - Fetch results referenced by incoming mini-blocks and wait for them
//!
//! ## Module Structure
//!
//! ```text
//! sn-04-intermediate-results/
//! ├── domain/          # TxInfo registry, IntermediateError
//! ├── algorithms/      # Deterministic mini-block packaging
//! ├── ports/           # IntermediateTransactionHandler, SmartContractResultProcessor
//! └── service/         # IntermediateResultsProcessor, SmartContractResultPreprocessor
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use algorithms::build_cross_shard_mini_blocks;
pub use domain::{IntermediateError, IntermediateResult, TxInfo, TxShardInfo, TxsForBlock};
pub use ports::{IntermediateTransactionHandler, MockResultProcessor, SmartContractResultProcessor};
pub use service::{IntermediateResultsProcessor, SmartContractResultPreprocessor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
