//! # Services
//!
//! Stateful orchestrators: the block validator with its notarization
//! history, and the shard block processor built on top of it.

pub mod shard_processor;
pub mod validator;

pub use shard_processor::{BroadcastData, ProcessorComponents, ProcessorConfig, ShardBlockProcessor};
pub use validator::BlockValidator;
