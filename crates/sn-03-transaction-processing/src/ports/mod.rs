//! # Ports
//!
//! Transaction processing API and the contract processor it delegates to.

pub mod inbound;
pub mod outbound;

pub use inbound::TransactionProcessor;
pub use outbound::{MockSmartContractProcessor, SmartContractProcessor};
