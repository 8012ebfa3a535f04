//! # Account Entity
//!
//! A balance/nonce record with optional contract code and a key/value data
//! store. Accounts are never deleted, only mutated through the ledger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash, U256};

use super::errors::{AccountsError, AccountsResult};

/// Ledger account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Account {
    /// Owner address.
    pub address: Address,
    /// Number of transactions sent.
    pub nonce: u64,
    /// Balance, never negative.
    pub balance: U256,
    /// Hash of `code`, empty for plain accounts.
    pub code_hash: Hash,
    /// Root of the account data store.
    pub root_hash: Hash,
    /// Contract code.
    pub code: Vec<u8>,
    /// Contract storage.
    pub data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl Account {
    /// Fresh account with zero balance and nonce.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ..Default::default()
        }
    }

    /// Returns true if the account holds code.
    pub fn is_contract(&self) -> bool {
        !self.code.is_empty()
    }

    /// Credit the balance.
    pub fn add_to_balance(&mut self, value: U256) {
        self.balance = self.balance.saturating_add(value);
    }

    /// Debit the balance, refusing to go negative.
    pub fn sub_from_balance(&mut self, value: U256) -> AccountsResult<()> {
        if self.balance < value {
            return Err(AccountsError::InsufficientBalance {
                required: value,
                available: self.balance,
            });
        }
        self.balance -= value;
        Ok(())
    }

    /// Increase the nonce by one.
    pub fn increase_nonce(&mut self) {
        self.nonce += 1;
    }

    /// Install contract code. The code hash is derived by the ledger on save.
    pub fn set_code(&mut self, code: Vec<u8>) {
        self.code = code;
    }

    /// Stored value for `key`.
    pub fn data_value(&self, key: &[u8]) -> Option<&[u8]> {
        self.data.get(key).map(Vec::as_slice)
    }

    /// Store a value; an empty value deletes the key.
    pub fn set_data_value(&mut self, key: Vec<u8>, value: Vec<u8>) {
        if value.is_empty() {
            self.data.remove(&key);
            return;
        }
        self.data.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_refuses_negative_balance() {
        let mut account = Account::new(Address::new(vec![1; 32]));
        account.add_to_balance(U256::from(10));

        assert!(account.sub_from_balance(U256::from(11)).is_err());
        assert_eq!(account.balance, U256::from(10));

        account.sub_from_balance(U256::from(10)).unwrap();
        assert!(account.balance.is_zero());
    }

    #[test]
    fn test_empty_value_deletes_key() {
        let mut account = Account::default();
        account.set_data_value(b"k".to_vec(), b"v".to_vec());
        assert_eq!(account.data_value(b"k"), Some(&b"v"[..]));

        account.set_data_value(b"k".to_vec(), Vec::new());
        assert_eq!(account.data_value(b"k"), None);
    }
}
