//! # Adapters
//!
//! Account-level contract handling and result settlement.

pub mod result_settlement;
pub mod settlement_contract;

pub use result_settlement::ResultSettlementProcessor;
pub use settlement_contract::SettlementContractProcessor;
