//! # Block Processing Errors

use shared_types::{CodecError, DataError, ShardId, StorageError};
use sn_01_account_ledger::AccountsError;
use sn_03_transaction_processing::TxProcessError;
use sn_04_intermediate_results::IntermediateError;
use thiserror::Error;

/// Result alias for this crate.
pub type BlockResult<T> = Result<T, BlockError>;

/// Errors raised while validating, executing or committing a block.
#[derive(Debug, Error)]
pub enum BlockError {
    /// No header was supplied.
    #[error("Nil header")]
    NilHeader,

    /// No body was supplied.
    #[error("Nil body")]
    NilBody,

    /// The header nonce does not follow the chain tip.
    #[error("Wrong nonce in block: expected {expected}, got {got}")]
    WrongNonceInBlock {
        /// Nonce that would follow the tip.
        expected: u64,
        /// Header nonce.
        got: u64,
    },

    /// The header round does not advance past the chain tip.
    #[error("Lower round in block: round {round}, current round {current_round}")]
    LowerRoundInBlock {
        /// Header round.
        round: u64,
        /// Round of the chain tip.
        current_round: u64,
    },

    /// The previous random seed does not match the tip's seed.
    #[error("Random seed mismatch")]
    RandSeedMismatch,

    /// The previous hash does not match the tip's hash.
    #[error("Block hash does not match")]
    BlockHashDoesNotMatch,

    /// Notarized header bookkeeping was not initialized.
    #[error("Notarized headers are not set")]
    NotarizedHdrsSliceIsNil,

    /// A header of the wrong variant for its shard.
    #[error("Wrong type assertion")]
    WrongTypeAssertion,

    /// The shard id is outside the configured range.
    #[error("Shard id {0} is not handled by this node")]
    ShardIdMissmatch(ShardId),

    /// A second genesis header follows a genesis that already holds state.
    #[error("Root state mismatch")]
    RootStateMissmatch,

    /// A notarized header does not advance the round.
    #[error("Lower round in other chain block")]
    LowerRoundInOtherChainBlock,

    /// A notarized header does not follow the previous nonce.
    #[error("Wrong nonce in other chain block")]
    WrongNonceInOtherChainBlock,

    /// A notarized header does not link to the previous hash.
    #[error("Hash does not match in other chain block")]
    HashDoesNotMatchInOtherChainBlock,

    /// Not enough headers chain on top of the header.
    #[error("Header with nonce {nonce} is not final")]
    HeaderNotFinal {
        /// Nonce of the header.
        nonce: u64,
    },

    /// The header's mini-block summaries disagree with the body.
    #[error("Header and body mismatch")]
    HeaderBodyMismatch,

    /// The state root after execution differs from the header.
    #[error("Root hash does not match")]
    RootHashDoesNotMatch,

    /// A referenced transaction is not in the pool.
    #[error("Missing transaction {0}")]
    MissingTransaction(String),

    /// Ran out of time while processing the block.
    #[error("Time is out")]
    TimeIsOut,

    /// Body failed its structural check.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Marshaling failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Storage access failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Account ledger failure.
    #[error(transparent)]
    Accounts(#[from] AccountsError),

    /// Transaction rejected.
    #[error(transparent)]
    TxProcess(#[from] TxProcessError),

    /// Smart contract result handling failed.
    #[error(transparent)]
    Intermediate(#[from] IntermediateError),
}

impl BlockError {
    /// Returns true if the error means data did not arrive in time.
    pub fn is_time_out(&self) -> bool {
        matches!(
            self,
            BlockError::TimeIsOut | BlockError::Intermediate(IntermediateError::TimeIsOut)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BlockError::WrongNonceInBlock {
            expected: 2,
            got: 3,
        };
        assert_eq!(err.to_string(), "Wrong nonce in block: expected 2, got 3");
        assert!(BlockError::ShardIdMissmatch(6).to_string().contains('6'));
    }

    #[test]
    fn test_time_out_detection() {
        assert!(BlockError::TimeIsOut.is_time_out());
        assert!(BlockError::from(IntermediateError::TimeIsOut).is_time_out());
        assert!(!BlockError::NilBody.is_time_out());
    }
}
