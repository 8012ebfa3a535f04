//! In-Memory Accounts Adapter
//!
//! Implements `AccountsAdapter` over an ordered map so the root hash is
//! deterministic across nodes.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::{Address, BincodeMarshalizer, Hash, Hasher, Marshalizer};
use tracing::debug;

use crate::domain::{Account, AccountsError, AccountsResult, Journal};
use crate::ports::AccountsAdapter;

struct LedgerState {
    accounts: BTreeMap<Address, Account>,
    journal: Journal,
}

/// In-memory journaled account store.
pub struct InMemoryAccountsDb<M: Marshalizer = BincodeMarshalizer> {
    state: Mutex<LedgerState>,
    marshalizer: M,
    hasher: Arc<dyn Hasher>,
}

impl<M: Marshalizer> InMemoryAccountsDb<M> {
    /// Create an empty ledger.
    pub fn new(marshalizer: M, hasher: Arc<dyn Hasher>) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                accounts: BTreeMap::new(),
                journal: Journal::default(),
            }),
            marshalizer,
            hasher,
        }
    }

    /// Number of stored accounts.
    pub fn len(&self) -> usize {
        self.state.lock().accounts.len()
    }

    /// Returns true if no account is stored.
    pub fn is_empty(&self) -> bool {
        self.state.lock().accounts.is_empty()
    }

    /// Recompute the derived hashes of an account before storing it.
    fn normalize(&self, account: &Account) -> AccountsResult<Account> {
        let mut stored = account.clone();
        stored.code_hash = if stored.code.is_empty() {
            Vec::new()
        } else {
            self.hasher.compute(&stored.code)
        };
        stored.root_hash = if stored.data.is_empty() {
            Vec::new()
        } else {
            let buff = self.marshalizer.marshal(&stored.data)?;
            self.hasher.compute(&buff)
        };
        Ok(stored)
    }

    fn compute_root(&self, accounts: &BTreeMap<Address, Account>) -> AccountsResult<Hash> {
        let mut buff = Vec::new();
        for account in accounts.values() {
            let encoded = self.marshalizer.marshal(account)?;
            buff.extend_from_slice(&self.hasher.compute(&encoded));
        }
        Ok(self.hasher.compute(&buff))
    }
}

impl<M: Marshalizer> AccountsAdapter for InMemoryAccountsDb<M> {
    fn get_existing_account(&self, address: &Address) -> AccountsResult<Account> {
        self.state
            .lock()
            .accounts
            .get(address)
            .cloned()
            .ok_or_else(|| AccountsError::AccNotFound(address.clone()))
    }

    fn get_account_with_journal(&self, address: &Address) -> AccountsResult<Account> {
        if address.is_empty() {
            return Err(AccountsError::EmptyAddress);
        }

        let mut state = self.state.lock();
        if let Some(account) = state.accounts.get(address) {
            return Ok(account.clone());
        }

        debug!("[sn-01] Creating account {}", address);
        let account = Account::new(address.clone());
        state.accounts.insert(address.clone(), account.clone());
        state.journal.record(address.clone(), None);
        Ok(account)
    }

    fn save_account(&self, account: &Account) -> AccountsResult<()> {
        if account.address.is_empty() {
            return Err(AccountsError::EmptyAddress);
        }

        let stored = self.normalize(account)?;
        let mut state = self.state.lock();
        let previous = state.accounts.insert(stored.address.clone(), stored);
        state.journal.record(account.address.clone(), previous);
        Ok(())
    }

    fn root_hash(&self) -> AccountsResult<Hash> {
        let state = self.state.lock();
        self.compute_root(&state.accounts)
    }

    fn commit(&self) -> AccountsResult<Hash> {
        let mut state = self.state.lock();
        let root = self.compute_root(&state.accounts)?;
        debug!(
            "[sn-01] Committed {} journal entries, root {}",
            state.journal.len(),
            hex::encode(&root)
        );
        state.journal.clear();
        Ok(root)
    }

    fn journal_len(&self) -> usize {
        self.state.lock().journal.len()
    }

    fn revert_to_snapshot(&self, snapshot: usize) -> AccountsResult<()> {
        let mut state = self.state.lock();
        let journal_len = state.journal.len();
        if snapshot > journal_len {
            return Err(AccountsError::InvalidSnapshot {
                requested: snapshot,
                journal_len,
            });
        }

        for entry in state.journal.drain_after(snapshot) {
            match entry.previous {
                Some(previous) => {
                    state.accounts.insert(entry.address, previous);
                }
                None => {
                    state.accounts.remove(&entry.address);
                }
            }
        }
        debug!("[sn-01] Reverted ledger to snapshot {}", snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::{Keccak256Hasher, U256};

    fn new_db() -> InMemoryAccountsDb {
        InMemoryAccountsDb::new(BincodeMarshalizer, Arc::new(Keccak256Hasher))
    }

    fn addr(byte: u8) -> Address {
        Address::new(vec![byte; 32])
    }

    #[test]
    fn test_get_existing_account_not_found() {
        let db = new_db();
        assert!(matches!(
            db.get_existing_account(&addr(1)),
            Err(AccountsError::AccNotFound(_))
        ));
    }

    #[test]
    fn test_get_account_with_journal_creates_on_miss() {
        let db = new_db();
        let account = db.get_account_with_journal(&addr(1)).unwrap();

        assert_eq!(account.nonce, 0);
        assert_eq!(db.journal_len(), 1);
        assert!(db.get_existing_account(&addr(1)).is_ok());
    }

    #[test]
    fn test_empty_address_rejected() {
        let db = new_db();
        assert!(matches!(
            db.get_account_with_journal(&Address::default()),
            Err(AccountsError::EmptyAddress)
        ));
    }

    #[test]
    fn test_revert_restores_previous_values() {
        let db = new_db();
        let mut account = db.get_account_with_journal(&addr(1)).unwrap();
        account.add_to_balance(U256::from(100));
        db.save_account(&account).unwrap();
        db.commit().unwrap();
        let committed_root = db.root_hash().unwrap();

        let snapshot = db.journal_len();
        account.add_to_balance(U256::from(5));
        db.save_account(&account).unwrap();
        db.get_account_with_journal(&addr(2)).unwrap();
        assert_ne!(db.root_hash().unwrap(), committed_root);

        db.revert_to_snapshot(snapshot).unwrap();

        assert_eq!(db.get_existing_account(&addr(1)).unwrap().balance, U256::from(100));
        assert!(db.get_existing_account(&addr(2)).is_err());
        assert_eq!(db.root_hash().unwrap(), committed_root);
    }

    #[test]
    fn test_revert_past_journal_end_fails() {
        let db = new_db();
        assert!(matches!(
            db.revert_to_snapshot(3),
            Err(AccountsError::InvalidSnapshot { requested: 3, .. })
        ));
    }

    #[test]
    fn test_code_hash_derived_on_save() {
        let db = new_db();
        let mut account = db.get_account_with_journal(&addr(9)).unwrap();
        account.code = b"contract".to_vec();
        account.set_data_value(b"k".to_vec(), b"v".to_vec());
        db.save_account(&account).unwrap();

        let stored = db.get_existing_account(&addr(9)).unwrap();
        assert_eq!(stored.code_hash, Keccak256Hasher.compute(b"contract"));
        assert!(!stored.root_hash.is_empty());
    }

    proptest! {
        #[test]
        fn test_root_hash_independent_of_write_order(balances in proptest::collection::vec(1u64..1_000, 1..8)) {
            let forward = new_db();
            let backward = new_db();

            let accounts: Vec<Account> = balances
                .iter()
                .enumerate()
                .map(|(i, b)| Account {
                    address: addr(i as u8 + 1),
                    balance: U256::from(*b),
                    ..Default::default()
                })
                .collect();

            for account in &accounts {
                forward.save_account(account).unwrap();
            }
            for account in accounts.iter().rev() {
                backward.save_account(account).unwrap();
            }

            prop_assert_eq!(forward.root_hash().unwrap(), backward.root_hash().unwrap());
        }
    }
}
