//! # Ports
//!
//! Ledger contract consumed by the transaction and block processors.

pub mod accounts;

pub use accounts::AccountsAdapter;
