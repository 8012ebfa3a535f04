//! # SN-07 Resolvers
//!
//! Moves data between nodes. Resolvers ask peers for missing
//! transactions, results, mini-blocks and headers, and answer the same
//! requests from local pools and storage. Produced blocks leave the node
//! through a bounded broadcast queue.
//!
//! **Component ID:** 7
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Name the pub/sub topics of every shard pair
//! - Request data by hash, hash list or nonce from a random peer
//! - Answer requests, packing bulk replies under a size limit
//! - Publish blocks, headers and cross-shard data without blocking
//!
//! ## Module Structure
//!
//! ```text
//! sn-07-resolvers/
//! ├── domain/          # topics, RequestData, ResolverError
//! ├── algorithms/      # SizeDataPacker
//! ├── ports/           # Messenger, MessageProcessor, Resolver
//! ├── adapters/        # in-process MemoryNetwork
//! └── service/         # resolvers, container factories, broadcast
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{MemoryMessenger, MemoryNetwork, RecordingProcessor};
pub use algorithms::SizeDataPacker;
pub use domain::{RequestData, RequestDataType, ResolverError, ResolverResult};
pub use ports::{Message, MessageProcessor, Messenger, PeerId, Resolver};
pub use service::{
    run_broadcast_worker, BroadcastConfig, BroadcastQueue, DiffPeerListCreator, HeaderResolver,
    MetaResolversContainerFactory, MiniBlockResolver, OutboundMessage, ResolverRequestHandler,
    ResolversContainer, ShardChainMessenger, ShardResolversContainerFactory, TopicResolverSender,
    TxResolver,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
