//! # Fork Detector Errors

use thiserror::Error;

/// Result alias for this crate.
pub type ForkResult<T> = Result<T, ForkDetectorError>;

/// Reasons a header is refused by the fork detector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForkDetectorError {
    /// The header hash is empty.
    #[error("Nil header hash")]
    NilHash,

    /// A received or processed header carries no signers.
    #[error("Block is not signed")]
    BlockIsNotSigned,

    /// A proposed header carries no random seeds.
    #[error("Random seed is not valid")]
    RandomSeedNotValid,

    /// The header round is at or behind the final checkpoint, or arrived late.
    #[error("Lower round in block: round {round}, checkpoint round {checkpoint_round}")]
    LowerRoundInBlock {
        /// Header round.
        round: u64,
        /// Final checkpoint round.
        checkpoint_round: u64,
    },

    /// The header round is beyond the next round.
    #[error("Higher round in block: round {round}, current round {current_round}")]
    HigherRoundInBlock {
        /// Header round.
        round: u64,
        /// Round the node is in.
        current_round: i64,
    },

    /// The header nonce is at or behind the final checkpoint.
    #[error("Lower nonce in block: nonce {nonce}, checkpoint nonce {checkpoint_nonce}")]
    LowerNonceInBlock {
        /// Header nonce.
        nonce: u64,
        /// Final checkpoint nonce.
        checkpoint_nonce: u64,
    },

    /// More nonces than elapsed rounds since the final checkpoint.
    #[error("Higher nonce in block: nonce {nonce}, highest reachable {max_nonce}")]
    HigherNonceInBlock {
        /// Header nonce.
        nonce: u64,
        /// Highest nonce reachable in the header round.
        max_nonce: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ForkDetectorError::LowerNonceInBlock {
            nonce: 1,
            checkpoint_nonce: 1,
        };
        assert!(err.to_string().contains("checkpoint nonce 1"));
        assert_eq!(ForkDetectorError::NilHash.to_string(), "Nil header hash");
    }
}
