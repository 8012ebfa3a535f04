//! # Journal
//!
//! Undo log for ledger mutations. Each entry records the value an address
//! held before a write; reverting replays entries newest first.

use shared_types::Address;

use super::account::Account;

/// One undoable write.
#[derive(Debug, Clone)]
pub struct JournalEntry {
    /// Address that was written.
    pub address: Address,
    /// Value before the write, `None` if the account was created.
    pub previous: Option<Account>,
}

/// Ordered undo log.
#[derive(Debug, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// Append an entry.
    pub fn record(&mut self, address: Address, previous: Option<Account>) {
        self.entries.push(JournalEntry { address, previous });
    }

    /// Number of entries; usable as a snapshot id.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pop entries newer than `snapshot`, newest first.
    pub fn drain_after(&mut self, snapshot: usize) -> Vec<JournalEntry> {
        let mut undone = self.entries.split_off(snapshot);
        undone.reverse();
        undone
    }

    /// Forget all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
