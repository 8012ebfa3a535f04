//! # Error Types
//!
//! Errors raised by the shared codec, storage and data structures.

use thiserror::Error;

use crate::storage::UnitType;

/// Marshal/unmarshal failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Encoding an object failed.
    #[error("Marshal failed: {0}")]
    Marshal(String),

    /// Decoding a buffer failed.
    #[error("Unmarshal failed: {0}")]
    Unmarshal(String),
}

/// Errors returned by a `StorageService`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// No value stored under the key.
    #[error("Key not found in {unit:?}: {key}")]
    KeyNotFound {
        /// Storage unit queried.
        unit: UnitType,
        /// Hex encoded key.
        key: String,
    },

    /// The storage unit is not configured.
    #[error("Storage unit not available: {0:?}")]
    UnitNotFound(UnitType),

    /// Backend write or read failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Structural errors in block data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    /// A mini-block carries no transaction hashes.
    #[error("Mini-block at index {index} is empty")]
    MiniBlockEmpty {
        /// Position of the offending mini-block in the body.
        index: usize,
    },
}

/// Errors raised by the in-memory data pools.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The store already holds its maximum number of entries.
    #[error("Pool full: capacity {capacity}")]
    PoolFull {
        /// Configured entry limit.
        capacity: usize,
    },
}
