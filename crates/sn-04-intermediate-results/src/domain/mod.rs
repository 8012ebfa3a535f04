//! # Domain Module
//!
//! Errors and the per-block result registry.

pub mod errors;
pub mod tx_info;

pub use errors::*;
pub use tx_info::*;
