//! # Shared Types Crate
//!
//! Data model, canonical codec and infrastructure ports shared by every
//! component of the shard node.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: headers, bodies and transactions are defined
//!   once here.
//! - **Deterministic Identity**: every hash is `Hasher(Marshalizer(obj))`,
//!   see [`codec::calculate_hash`].
//! - **Tagged Headers**: shard and meta headers are variants of [`Header`],
//!   matched instead of downcast.

pub mod codec;
pub mod constants;
pub mod entities;
pub mod errors;
pub mod pool;
pub mod ports;
pub mod storage;

pub use codec::{calculate_hash, BincodeMarshalizer, Hasher, Keccak256Hasher, Marshalizer, Sha256Hasher};
pub use constants::*;
pub use entities::*;
pub use errors::*;
pub use pool::{
    shard_cacher_identifier, shard_label, AddedHandler, DataPools, HashCache, NonceHashCache, ShardedDataPool,
};
pub use ports::{MockRequestHandler, RecordedRequest, RequestHandler};
pub use storage::{MemoryStorage, StorageService, UnitType};
