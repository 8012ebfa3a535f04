//! # Adapters
//!
//! Implementations of the ledger port plus the contract-facing view.

pub mod memory_accounts;
pub mod vm_accounts;

pub use memory_accounts::InMemoryAccountsDb;
pub use vm_accounts::VmAccountsView;
