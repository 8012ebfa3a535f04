//! # Outbound Ports
//!
//! Settlement of a received smart contract result against local accounts.

use parking_lot::Mutex;
use shared_types::SmartContractResult;

use crate::domain::{IntermediateError, IntermediateResult};

/// Applies one smart contract result to the local ledger.
pub trait SmartContractResultProcessor: Send + Sync {
    /// Settle `scr`. Implementations report their own failures as
    /// `IntermediateError::ResultRejected`.
    fn process_smart_contract_result(&self, scr: &SmartContractResult) -> IntermediateResult<()>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Result processor recording every settled result.
#[derive(Default)]
pub struct MockResultProcessor {
    processed: Mutex<Vec<SmartContractResult>>,
    reject: bool,
}

impl MockResultProcessor {
    /// Processor accepting everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Processor rejecting everything.
    pub fn rejecting() -> Self {
        Self {
            processed: Mutex::new(Vec::new()),
            reject: true,
        }
    }

    /// Results settled so far.
    pub fn processed(&self) -> Vec<SmartContractResult> {
        self.processed.lock().clone()
    }
}

impl SmartContractResultProcessor for MockResultProcessor {
    fn process_smart_contract_result(&self, scr: &SmartContractResult) -> IntermediateResult<()> {
        if self.reject {
            return Err(IntermediateError::ResultRejected("mock rejection".into()));
        }
        self.processed.lock().push(scr.clone());
        Ok(())
    }
}
