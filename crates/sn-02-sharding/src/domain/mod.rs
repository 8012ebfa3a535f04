//! # Domain Module
//!
//! Core types for the sharding component.

pub mod address;
pub mod coordinator;
pub mod errors;

pub use address::*;
pub use coordinator::*;
pub use errors::*;
