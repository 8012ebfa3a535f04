//! Resolver errors.

use shared_types::{CodecError, DataError, PoolError, StorageError};
use sn_02_sharding::ShardingError;
use thiserror::Error;

/// Result type for resolver operations.
pub type ResolverResult<T> = Result<T, ResolverError>;

/// Errors raised by the messenger, resolvers and their container.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The topic was never created on this messenger.
    #[error("Topic {0} not found")]
    TopicNotFound(String),

    /// The topic already exists.
    #[error("Topic {0} already exists")]
    TopicAlreadyExists(String),

    /// A processor is already registered on the topic.
    #[error("Topic {0} already has a message processor")]
    ProcessorAlreadyRegistered(String),

    /// The target peer is not connected.
    #[error("Peer {0} not found")]
    PeerNotFound(String),

    /// The target peer does not listen on the topic.
    #[error("Peer {peer} is not on topic {topic}")]
    PeerNotOnTopic {
        /// Target peer.
        peer: String,
        /// Topic the message was sent on.
        topic: String,
    },

    /// Nobody to ask on the topic.
    #[error("No connected peer to send request on topic {0}")]
    NoConnectedPeerToSendRequest(String),

    /// A resolver is already stored under the key.
    #[error("Container key {0} already exists")]
    ContainerKeyAlreadyExists(String),

    /// No resolver is stored under the key.
    #[error("Invalid container key {0}")]
    InvalidContainerKey(String),

    /// Keys and values of a batch insert differ in length.
    #[error("Length mismatch: {keys} keys for {values} values")]
    LenMismatch {
        /// Number of keys.
        keys: usize,
        /// Number of values.
        values: usize,
    },

    /// The resolver does not answer this kind of request.
    #[error("Resolve type unknown")]
    ResolveTypeUnknown,

    /// The requested item is neither pooled nor stored.
    #[error("Requested item {0} not found")]
    RequestedItemNotFound(String),

    /// A nonce request did not carry eight bytes.
    #[error("Invalid nonce byte slice")]
    InvalidNonceByteSlice,

    /// Chunk limit must be positive.
    #[error("Invalid chunk limit {0}")]
    InvalidChunkLimit(usize),

    /// An intercepted item has no sender address.
    #[error("Nil sender address")]
    NilSenderAddress,

    /// An intercepted item has no receiver address.
    #[error("Nil receiver address")]
    NilReceiverAddress,

    /// An intercepted result does not name its originating transaction.
    #[error("Nil transaction hash")]
    NilTxHash,

    /// The sender address failed conversion.
    #[error("Invalid sender address: {0}")]
    InvalidSenderAddress(ShardingError),

    /// The receiver address failed conversion.
    #[error("Invalid receiver address: {0}")]
    InvalidReceiverAddress(ShardingError),

    /// Marshaling failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Block data failed its structural check.
    #[error(transparent)]
    Data(#[from] DataError),

    /// A data pool refused the item.
    #[error(transparent)]
    Pool(#[from] PoolError),
}
