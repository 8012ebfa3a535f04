//! # SN-01 Account Ledger
//!
//! Journaled account store owned by the shard node.
//!
//! **Component ID:** 1
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Own every account of the local shard (balance, nonce, code, data)
//! - Record each write in a journal so a rejected block rolls back cleanly
//! - Expose a deterministic root hash over all accounts
//! - Offer a read-only view for contract execution
//!
//! ## Module Structure
//!
//! ```text
//! sn-01-account-ledger/
//! ├── domain/          # Account, Journal, AccountsError
//! ├── ports/           # AccountsAdapter trait
//! └── adapters/        # InMemoryAccountsDb, VmAccountsView
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{InMemoryAccountsDb, VmAccountsView};
pub use domain::{Account, AccountsError, AccountsResult, Journal, JournalEntry};
pub use ports::AccountsAdapter;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
