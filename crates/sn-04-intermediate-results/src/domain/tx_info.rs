//! # Per-Block Result Registry
//!
//! Results used while one block is created or processed, keyed by hash.
//! Entries without a payload are results requested from peers and not yet
//! received.

use std::collections::HashMap;

use shared_types::{Hash, ShardId, SmartContractResult};

/// Shard pair of a filed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxShardInfo {
    /// Origin shard.
    pub sender_shard_id: ShardId,
    /// Destination shard.
    pub receiver_shard_id: ShardId,
}

/// A filed or awaited result.
#[derive(Debug, Clone)]
pub struct TxInfo {
    /// Payload, `None` while the result is requested.
    pub tx: Option<SmartContractResult>,
    /// Shard pair.
    pub shard_info: TxShardInfo,
}

/// Registry state guarded by a single lock.
#[derive(Debug, Default)]
pub struct TxsForBlock {
    /// Results by hash.
    pub tx_hash_and_info: HashMap<Hash, TxInfo>,
    /// Requested results not yet received.
    pub missing_txs: usize,
}

impl TxsForBlock {
    /// Drop every entry.
    pub fn reset(&mut self) {
        self.tx_hash_and_info.clear();
        self.missing_txs = 0;
    }

    /// Fill an awaited entry. Returns true if it was the last missing one.
    pub fn fill_missing(&mut self, hash: &[u8], tx: SmartContractResult) -> bool {
        let Some(info) = self.tx_hash_and_info.get_mut(hash) else {
            return false;
        };
        if info.tx.is_some() {
            return false;
        }

        info.tx = Some(tx);
        self.missing_txs = self.missing_txs.saturating_sub(1);
        self.missing_txs == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn awaited() -> TxInfo {
        TxInfo {
            tx: None,
            shard_info: TxShardInfo {
                sender_shard_id: 1,
                receiver_shard_id: 0,
            },
        }
    }

    #[test]
    fn test_fill_missing_counts_down() {
        let mut registry = TxsForBlock::default();
        registry.tx_hash_and_info.insert(b"a".to_vec(), awaited());
        registry.tx_hash_and_info.insert(b"b".to_vec(), awaited());
        registry.missing_txs = 2;

        assert!(!registry.fill_missing(b"a", SmartContractResult::default()));
        // Second delivery of the same hash changes nothing
        assert!(!registry.fill_missing(b"a", SmartContractResult::default()));
        assert!(!registry.fill_missing(b"unknown", SmartContractResult::default()));
        assert!(registry.fill_missing(b"b", SmartContractResult::default()));
        assert_eq!(registry.missing_txs, 0);
    }
}
