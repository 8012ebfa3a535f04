//! # Domain Module
//!
//! Registry entries, checkpoints and errors.

pub mod errors;
pub mod header_info;

pub use errors::*;
pub use header_info::*;
