//! # Domain Module
//!
//! Core types for the account ledger.

pub mod account;
pub mod errors;
pub mod journal;

pub use account::*;
pub use errors::*;
pub use journal::*;
