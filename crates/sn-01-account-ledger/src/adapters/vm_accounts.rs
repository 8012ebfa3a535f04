//! VM Accounts View
//!
//! Read-only blockchain hook handed to contract execution. Temporary
//! accounts registered for the current call shadow the ledger.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::{Address, U256};

use crate::domain::{Account, AccountsError, AccountsResult};
use crate::ports::AccountsAdapter;

/// Contract-facing view over an `AccountsAdapter`.
pub struct VmAccountsView {
    accounts: Arc<dyn AccountsAdapter>,
    temp_accounts: Mutex<HashMap<Address, Account>>,
}

impl VmAccountsView {
    /// Wrap a ledger.
    pub fn new(accounts: Arc<dyn AccountsAdapter>) -> Self {
        Self {
            accounts,
            temp_accounts: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if the address is known (temporary or stored).
    pub fn account_exists(&self, address: &Address) -> AccountsResult<bool> {
        match self.lookup(address) {
            Ok(_) => Ok(true),
            Err(AccountsError::AccNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Balance, zero for unknown accounts.
    pub fn get_balance(&self, address: &Address) -> AccountsResult<U256> {
        self.or_default(address, |account| account.balance)
    }

    /// Nonce, zero for unknown accounts.
    pub fn get_nonce(&self, address: &Address) -> AccountsResult<u64> {
        self.or_default(address, |account| account.nonce)
    }

    /// Stored value for `key`, empty for unknown accounts or keys.
    pub fn get_storage_data(&self, address: &Address, key: &[u8]) -> AccountsResult<Vec<u8>> {
        self.or_default(address, |account| {
            account.data_value(key).map(<[u8]>::to_vec).unwrap_or_default()
        })
    }

    /// Returns true if the account has no code or does not exist.
    pub fn is_code_empty(&self, address: &Address) -> AccountsResult<bool> {
        match self.lookup(address) {
            Ok(account) => Ok(!account.is_contract()),
            Err(AccountsError::AccNotFound(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Contract code; fails `EmptyCode` for plain accounts.
    pub fn get_code(&self, address: &Address) -> AccountsResult<Vec<u8>> {
        let account = self.lookup(address)?;
        if !account.is_contract() {
            return Err(AccountsError::EmptyCode);
        }
        Ok(account.code)
    }

    /// Register a temporary account for the current call.
    pub fn add_temp_account(&self, address: Address, balance: U256, nonce: u64) {
        let account = Account {
            address: address.clone(),
            balance,
            nonce,
            ..Default::default()
        };
        self.temp_accounts.lock().insert(address, account);
    }

    /// Drop all temporary accounts.
    pub fn clean_temp_accounts(&self) {
        self.temp_accounts.lock().clear();
    }

    /// Temporary account registered for `address`.
    pub fn temp_account(&self, address: &Address) -> Option<Account> {
        self.temp_accounts.lock().get(address).cloned()
    }

    fn lookup(&self, address: &Address) -> AccountsResult<Account> {
        if let Some(account) = self.temp_account(address) {
            return Ok(account);
        }
        self.accounts.get_existing_account(address)
    }

    fn or_default<T: Default>(
        &self,
        address: &Address,
        read: impl FnOnce(&Account) -> T,
    ) -> AccountsResult<T> {
        match self.lookup(address) {
            Ok(account) => Ok(read(&account)),
            Err(AccountsError::AccNotFound(_)) => Ok(T::default()),
            Err(e) => Err(e),
        }
    }
}
