//! # Genesis Module
//!
//! Genesis headers and initial ledger state.
//!
//! Every shard and the metachain start from a nonce-0 header with an empty
//! previous hash and a seed derived from the shard id. The node's own
//! genesis hash is what its first block links to.

pub mod builder;

pub use builder::{GenesisBlocks, GenesisBuilder, GenesisConfig, GenesisError};
