//! # Domain Module
//!
//! Chain handle and errors.

pub mod chain;
pub mod errors;

pub use chain::BlockChain;
pub use errors::*;
