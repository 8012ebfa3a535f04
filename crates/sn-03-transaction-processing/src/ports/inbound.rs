//! # Inbound Ports

use shared_types::Transaction;

use crate::domain::TxProcessResult;

/// Applies user transactions to the local ledger.
pub trait TransactionProcessor: Send + Sync {
    /// Apply `tx` in `round`.
    ///
    /// Only accounts resident in this shard are touched: a cross-shard
    /// transfer debits on the sender's shard and credits on the receiver's.
    fn process_transaction(&self, tx: &Transaction, round: u64) -> TxProcessResult<()>;
}
