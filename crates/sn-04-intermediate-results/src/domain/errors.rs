//! # Intermediate Result Errors

use shared_types::{CodecError, PoolError, StorageError};
use sn_02_sharding::ShardingError;
use thiserror::Error;

/// Result alias for this crate.
pub type IntermediateResult<T> = Result<T, IntermediateError>;

/// Errors raised while filing, packaging or fetching smart contract results.
#[derive(Debug, Error)]
pub enum IntermediateError {
    /// A payload of the wrong variant reached the aggregator.
    #[error("Wrong type assertion: expected a smart contract result")]
    WrongTypeAssertion,

    /// The body carries a result mini-block this node did not produce.
    #[error("No locally created result mini-block for shard {0}")]
    NilMiniBlocks(u32),

    /// A result mini-block differs from the locally created one.
    #[error("Mini-block hash mismatch for shard {0}")]
    MiniBlockHashMismatch(u32),

    /// A referenced result is not known locally.
    #[error("Missing transaction {0}")]
    MissingTransaction(String),

    /// Waiting for requested results ran out of time.
    #[error("Time is out while waiting for smart contract results")]
    TimeIsOut,

    /// The mini-block is not a result mini-block.
    #[error("Wrong type in mini-block: {0}")]
    WrongTypeInMiniBlock(String),

    /// No pool store exists for the cache identifier.
    #[error("No result pool store for {0}")]
    MissingPoolStore(String),

    /// The result processor rejected a result.
    #[error("Smart contract result rejected: {0}")]
    ResultRejected(String),

    /// Address could not be mapped to a shard.
    #[error(transparent)]
    Sharding(#[from] ShardingError),

    /// Marshaling failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Storage access failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A pool refused the data.
    #[error(transparent)]
    Pool(#[from] PoolError),
}
