//! # Registry Entries
//!
//! Headers tracked per nonce, the checkpoints the detector prunes against,
//! and the outcome of a fork check.

use shared_types::{Hash, Header, HeaderState};

/// A header registered under its nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    /// The header itself.
    pub header: Header,
    /// Its hash.
    pub hash: Hash,
    /// Lifecycle state on this node.
    pub state: HeaderState,
}

impl HeaderInfo {
    /// Create an entry.
    pub fn new(header: Header, hash: Hash, state: HeaderState) -> Self {
        Self {
            header,
            hash,
            state,
        }
    }

    /// Header nonce.
    pub fn nonce(&self) -> u64 {
        self.header.nonce()
    }

    /// Header round.
    pub fn round(&self) -> u64 {
        self.header.round()
    }

    /// Returns true if this node applied or notarized the header.
    pub fn is_local(&self) -> bool {
        matches!(self.state, HeaderState::Processed | HeaderState::Notarized)
    }
}

/// A `(nonce, round)` pair of a processed or final header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Checkpoint {
    /// Nonce of the backing header.
    pub nonce: u64,
    /// Round of the backing header.
    pub round: u64,
}

impl Checkpoint {
    /// Create a checkpoint.
    pub fn new(nonce: u64, round: u64) -> Self {
        Self { nonce, round }
    }

    /// Returns true if `next` directly follows this checkpoint in both
    /// nonce and round, `finality` steps apart.
    pub fn is_followed_by(&self, next: &Checkpoint, finality: u64) -> bool {
        next.nonce == self.nonce + finality && next.round == self.round + finality
    }
}

/// Outcome of [`crate::ForkDetector::check_fork`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkCheck {
    /// True if a competing header won the fork choice.
    pub detected: bool,
    /// Lowest forked nonce, `u64::MAX` when none.
    pub nonce: u64,
    /// Hash of the header to switch to.
    pub hash: Option<Hash>,
}

impl ForkCheck {
    /// No fork found.
    pub fn none() -> Self {
        Self {
            detected: false,
            nonce: u64::MAX,
            hash: None,
        }
    }

    /// Fork at `nonce` toward `hash`.
    pub fn at(nonce: u64, hash: Hash) -> Self {
        Self {
            detected: true,
            nonce,
            hash: Some(hash),
        }
    }
}
