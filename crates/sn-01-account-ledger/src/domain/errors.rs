//! # Domain Errors
//!
//! Error types for the account ledger.

use shared_types::{Address, CodecError, U256};
use thiserror::Error;

/// Ledger result alias.
pub type AccountsResult<T> = Result<T, AccountsError>;

/// Account ledger errors.
#[derive(Debug, Error)]
pub enum AccountsError {
    /// No account stored at the address.
    #[error("Account not found: {0}")]
    AccNotFound(Address),

    /// Address with no bytes.
    #[error("Empty address")]
    EmptyAddress,

    /// Debit would make the balance negative.
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount to debit
        required: U256,
        /// Current balance
        available: U256,
    },

    /// Snapshot index past the journal end.
    #[error("Invalid snapshot {requested}, journal length {journal_len}")]
    InvalidSnapshot {
        /// Requested journal length
        requested: usize,
        /// Current journal length
        journal_len: usize,
    },

    /// Account has no code.
    #[error("Account code is empty")]
    EmptyCode,

    /// Canonical encoding failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
