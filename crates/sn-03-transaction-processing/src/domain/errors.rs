//! # Domain Errors
//!
//! Error types for transaction processing.

use shared_types::{CodecError, U256};
use sn_01_account_ledger::AccountsError;
use sn_02_sharding::ShardingError;
use sn_04_intermediate_results::IntermediateError;
use thiserror::Error;

/// Transaction processing result alias.
pub type TxProcessResult<T> = Result<T, TxProcessError>;

/// Errors raised while applying a transaction or a smart contract result.
#[derive(Debug, Error)]
pub enum TxProcessError {
    /// Transaction nonce is ahead of the sender account.
    #[error("Higher nonce in transaction: account {account}, transaction {transaction}")]
    HigherNonceInTransaction {
        /// Sender account nonce
        account: u64,
        /// Transaction nonce
        transaction: u64,
    },

    /// Transaction nonce is behind the sender account.
    #[error("Lower nonce in transaction: account {account}, transaction {transaction}")]
    LowerNonceInTransaction {
        /// Sender account nonce
        account: u64,
        /// Transaction nonce
        transaction: u64,
    },

    /// Sender cannot cover value plus fee.
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Value plus fee
        required: U256,
        /// Sender balance
        available: U256,
    },

    /// Value plus fee does not fit a `U256`.
    #[error("Value overflow: value plus fee exceeds the balance range")]
    ValueOverflow,

    /// The transaction fits no known type.
    #[error("Wrong transaction: empty receiver without deployment data")]
    WrongTransaction,

    /// Malformed `hex(key)@hex(value)` storage update.
    #[error("Invalid storage update: {0}")]
    InvalidStorageUpdate(String),

    /// Ledger failure.
    #[error(transparent)]
    Accounts(#[from] AccountsError),

    /// Address or shard mapping failure.
    #[error(transparent)]
    Sharding(#[from] ShardingError),

    /// Filing a result with the aggregator failed.
    #[error(transparent)]
    Intermediate(#[from] IntermediateError),

    /// Canonical encoding failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
