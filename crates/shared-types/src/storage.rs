//! # Storage Port
//!
//! Key/value persistence addressed by logical storage unit. The storage
//! engine itself is an external collaborator; `MemoryStorage` backs tests
//! and single-process runs.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::entities::ShardId;
use crate::errors::StorageError;

/// Logical storage units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    /// Intercepted user transactions.
    Transaction,
    /// Marshaled mini-blocks.
    MiniBlock,
    /// Metachain headers.
    MetaBlock,
    /// Shard headers.
    BlockHeader,
    /// Smart contract results.
    UnsignedTransaction,
    /// Validator set changes.
    PeerChanges,
    /// Metachain nonce to header hash index.
    MetaHdrNonceHash,
    /// Shard nonce to header hash index, one unit per shard.
    ShardHdrNonceHash(ShardId),
}

/// Storage collaborator contract.
pub trait StorageService: Send + Sync {
    /// Store a value.
    fn put(&self, unit: UnitType, key: &[u8], value: Vec<u8>) -> Result<(), StorageError>;

    /// Fetch a value.
    fn get(&self, unit: UnitType, key: &[u8]) -> Result<Vec<u8>, StorageError>;

    /// Fetch several values; fails on the first missing key.
    fn get_all(
        &self,
        unit: UnitType,
        keys: &[Vec<u8>],
    ) -> Result<HashMap<Vec<u8>, Vec<u8>>, StorageError> {
        let mut result = HashMap::with_capacity(keys.len());
        for key in keys {
            let value = self.get(unit, key)?;
            result.insert(key.clone(), value);
        }
        Ok(result)
    }

    /// Returns true if the key is stored.
    fn has(&self, unit: UnitType, key: &[u8]) -> Result<bool, StorageError>;

    /// Delete a value. Missing keys are not an error.
    fn remove(&self, unit: UnitType, key: &[u8]) -> Result<(), StorageError>;
}

/// In-memory implementation of `StorageService`.
#[derive(Default)]
pub struct MemoryStorage {
    units: RwLock<HashMap<UnitType, HashMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held in a unit.
    pub fn len(&self, unit: UnitType) -> usize {
        self.units.read().get(&unit).map_or(0, HashMap::len)
    }

    /// Returns true if the unit holds no entries.
    pub fn is_empty(&self, unit: UnitType) -> bool {
        self.len(unit) == 0
    }
}

impl StorageService for MemoryStorage {
    fn put(&self, unit: UnitType, key: &[u8], value: Vec<u8>) -> Result<(), StorageError> {
        self.units
            .write()
            .entry(unit)
            .or_default()
            .insert(key.to_vec(), value);
        Ok(())
    }

    fn get(&self, unit: UnitType, key: &[u8]) -> Result<Vec<u8>, StorageError> {
        self.units
            .read()
            .get(&unit)
            .and_then(|entries| entries.get(key).cloned())
            .ok_or_else(|| StorageError::KeyNotFound {
                unit,
                key: hex::encode(key),
            })
    }

    fn has(&self, unit: UnitType, key: &[u8]) -> Result<bool, StorageError> {
        Ok(self
            .units
            .read()
            .get(&unit)
            .is_some_and(|entries| entries.contains_key(key)))
    }

    fn remove(&self, unit: UnitType, key: &[u8]) -> Result<(), StorageError> {
        if let Some(entries) = self.units.write().get_mut(&unit) {
            entries.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_operations() {
        let storage = MemoryStorage::new();

        storage.put(UnitType::Transaction, b"k1", vec![1, 2]).unwrap();
        assert_eq!(storage.get(UnitType::Transaction, b"k1").unwrap(), vec![1, 2]);
        assert!(storage.has(UnitType::Transaction, b"k1").unwrap());

        // Units are isolated
        assert!(!storage.has(UnitType::MiniBlock, b"k1").unwrap());

        storage.remove(UnitType::Transaction, b"k1").unwrap();
        assert!(matches!(
            storage.get(UnitType::Transaction, b"k1"),
            Err(StorageError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn test_get_all_fails_on_missing_key() {
        let storage = MemoryStorage::new();
        storage.put(UnitType::UnsignedTransaction, b"a", vec![1]).unwrap();

        let found = storage
            .get_all(UnitType::UnsignedTransaction, &[b"a".to_vec()])
            .unwrap();
        assert_eq!(found.len(), 1);

        let result = storage.get_all(UnitType::UnsignedTransaction, &[b"a".to_vec(), b"b".to_vec()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_shard_nonce_units_are_distinct() {
        let storage = MemoryStorage::new();
        storage.put(UnitType::ShardHdrNonceHash(0), b"n", vec![0]).unwrap();
        storage.put(UnitType::ShardHdrNonceHash(1), b"n", vec![1]).unwrap();

        assert_eq!(storage.get(UnitType::ShardHdrNonceHash(0), b"n").unwrap(), vec![0]);
        assert_eq!(storage.get(UnitType::ShardHdrNonceHash(1), b"n").unwrap(), vec![1]);
        assert_eq!(storage.len(UnitType::ShardHdrNonceHash(1)), 1);
    }
}
