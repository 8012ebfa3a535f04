//! # Accounts Port
//!
//! Ownership interface over the versioned account store. Every write is
//! journaled so a failed block can be rolled back to a snapshot.

use shared_types::{Address, Hash};

use crate::domain::{Account, AccountsResult};

/// Account ledger store.
pub trait AccountsAdapter: Send + Sync {
    /// Load an account, failing with `AccNotFound` if it was never written.
    fn get_existing_account(&self, address: &Address) -> AccountsResult<Account>;

    /// Load an account, creating (and journaling) it on a miss.
    fn get_account_with_journal(&self, address: &Address) -> AccountsResult<Account>;

    /// Store an account, journaling the previous value.
    fn save_account(&self, account: &Account) -> AccountsResult<()>;

    /// Root hash over every account.
    fn root_hash(&self) -> AccountsResult<Hash>;

    /// Make all journaled writes permanent and return the new root.
    fn commit(&self) -> AccountsResult<Hash>;

    /// Current journal length, used as a snapshot id.
    fn journal_len(&self) -> usize;

    /// Undo every write made after `snapshot`.
    fn revert_to_snapshot(&self, snapshot: usize) -> AccountsResult<()>;
}
