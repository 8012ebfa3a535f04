//! # Outbound Ports
//!
//! Contract handling delegated by the transaction dispatcher.

use parking_lot::Mutex;
use shared_types::Transaction;
use sn_01_account_ledger::Account;

use crate::domain::{TransactionType, TxProcessResult};

/// Contract-side processing of transactions.
///
/// Accounts are passed only when resident in this shard.
pub trait SmartContractProcessor: Send + Sync {
    /// Classify a transaction.
    fn compute_transaction_type(&self, tx: &Transaction) -> TxProcessResult<TransactionType>;

    /// Create a contract from the code in `tx.data`.
    fn deploy_smart_contract(
        &self,
        tx: &Transaction,
        sender: Option<Account>,
        round: u64,
    ) -> TxProcessResult<()>;

    /// Call an existing contract.
    fn execute_smart_contract_transaction(
        &self,
        tx: &Transaction,
        sender: Option<Account>,
        receiver: Option<Account>,
        round: u64,
    ) -> TxProcessResult<()>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Contract processor returning a fixed type and recording calls.
pub struct MockSmartContractProcessor {
    tx_type: TransactionType,
    calls: Mutex<Vec<(TransactionType, bool, bool)>>,
}

impl MockSmartContractProcessor {
    /// Mock classifying every transaction as `tx_type`.
    pub fn new(tx_type: TransactionType) -> Self {
        Self {
            tx_type,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Recorded calls: type, sender passed, receiver passed.
    pub fn calls(&self) -> Vec<(TransactionType, bool, bool)> {
        self.calls.lock().clone()
    }
}

impl SmartContractProcessor for MockSmartContractProcessor {
    fn compute_transaction_type(&self, _tx: &Transaction) -> TxProcessResult<TransactionType> {
        Ok(self.tx_type)
    }

    fn deploy_smart_contract(
        &self,
        _tx: &Transaction,
        sender: Option<Account>,
        _round: u64,
    ) -> TxProcessResult<()> {
        self.calls
            .lock()
            .push((TransactionType::SCDeployment, sender.is_some(), false));
        Ok(())
    }

    fn execute_smart_contract_transaction(
        &self,
        _tx: &Transaction,
        sender: Option<Account>,
        receiver: Option<Account>,
        _round: u64,
    ) -> TxProcessResult<()> {
        self.calls.lock().push((
            TransactionType::SCInvoking,
            sender.is_some(),
            receiver.is_some(),
        ));
        Ok(())
    }
}
