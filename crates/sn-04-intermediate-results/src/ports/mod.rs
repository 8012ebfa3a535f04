//! # Ports
//!
//! API offered to the transaction dispatcher and block processor, and the
//! result processor this crate drives.

pub mod inbound;
pub mod outbound;

pub use inbound::IntermediateTransactionHandler;
pub use outbound::{MockResultProcessor, SmartContractResultProcessor};
