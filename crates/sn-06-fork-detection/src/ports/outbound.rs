//! Driven port: the consensus round clock.

use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current consensus round.
pub trait Rounder: Send + Sync {
    /// Current round index.
    fn index(&self) -> i64;
}

/// Manually driven round clock for tests.
#[derive(Debug, Default)]
pub struct MockRounder {
    index: AtomicI64,
}

impl MockRounder {
    /// Clock starting at `index`.
    pub fn new(index: i64) -> Self {
        Self {
            index: AtomicI64::new(index),
        }
    }

    /// Move the clock.
    pub fn set_index(&self, index: i64) {
        self.index.store(index, Ordering::SeqCst);
    }
}

impl Rounder for MockRounder {
    fn index(&self) -> i64 {
        self.index.load(Ordering::SeqCst)
    }
}
