//! # SN-03 Transaction Processing
//!
//! Classifies user transactions and applies them to the local ledger.
//!
//! **Component ID:** 3
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Validate nonce and funds of senders resident in this shard
//! - Move balances: debit on the sender's shard, credit on the receiver's
//! - Dispatch deployments and invocations to the contract processor
//! - Settle smart contract results addressed to this shard
//!
//! ## Module Structure
//!
//! ```text
//! sn-03-transaction-processing/
//! ├── domain/          # TransactionType, TxProcessError
//! ├── algorithms/      # Classification, value checks, storage update encoding
//! ├── ports/           # TransactionProcessor, SmartContractProcessor
//! ├── adapters/        # SettlementContractProcessor, ResultSettlementProcessor
//! └── service.rs       # TxProcessor
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{ResultSettlementProcessor, SettlementContractProcessor};
pub use algorithms::{
    check_tx_values, classify_transaction, encode_storage_updates, parse_storage_updates, required_funds,
};
pub use domain::{TransactionType, TxProcessError, TxProcessResult};
pub use ports::{MockSmartContractProcessor, SmartContractProcessor, TransactionProcessor};
pub use service::TxProcessor;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
