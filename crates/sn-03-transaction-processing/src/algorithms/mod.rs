//! # Algorithms
//!
//! Pure transaction rules.

pub mod classify;
pub mod storage_updates;

pub use classify::{check_tx_values, classify_transaction, required_funds};
pub use storage_updates::{encode_storage_updates, parse_storage_updates};
