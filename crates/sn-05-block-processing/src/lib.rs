//! # SN-05 Block Processing
//!
//! Decides whether a block may extend the local chain, tracks which
//! headers of other chains are notarized, and builds, executes and commits
//! shard blocks.
//!
//! **Component ID:** 5
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Check a proposed block against the chain tip
//! - Validate header chains from other shards and the metachain
//! - Keep the per-shard history of notarized headers
//! - Execute blocks against the ledger with rollback on failure
//! - Persist committed blocks and hand them to the fork detector
//!
//! ## Module Structure
//!
//! ```text
//! sn-05-block-processing/
//! ├── domain/          # BlockChain, BlockError
//! ├── algorithms/      # header chaining and finality rules
//! └── service/         # BlockValidator, ShardBlockProcessor
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;
pub mod service;

// Re-exports
pub use algorithms::{check_header_finality, is_hdr_construction_valid};
pub use domain::{BlockChain, BlockError, BlockResult};
pub use service::{BlockValidator, BroadcastData, ProcessorComponents, ProcessorConfig, ShardBlockProcessor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
