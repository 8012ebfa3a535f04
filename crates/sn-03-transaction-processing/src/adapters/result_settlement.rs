//! Result Settlement
//!
//! Applies smart contract results addressed to this shard: value credit,
//! code installation and storage updates.

use std::sync::Arc;

use shared_types::SmartContractResult;
use sn_01_account_ledger::AccountsAdapter;
use sn_02_sharding::{AddressConverter, ShardCoordinator};
use sn_04_intermediate_results::{IntermediateError, IntermediateResult, SmartContractResultProcessor};
use tracing::debug;

use crate::algorithms::parse_storage_updates;
use crate::domain::TxProcessResult;

/// Settles smart contract results against the local ledger.
pub struct ResultSettlementProcessor {
    accounts: Arc<dyn AccountsAdapter>,
    address_converter: Arc<dyn AddressConverter>,
    shard_coordinator: Arc<dyn ShardCoordinator>,
}

impl ResultSettlementProcessor {
    /// Create a settlement processor.
    pub fn new(
        accounts: Arc<dyn AccountsAdapter>,
        address_converter: Arc<dyn AddressConverter>,
        shard_coordinator: Arc<dyn ShardCoordinator>,
    ) -> Self {
        Self {
            accounts,
            address_converter,
            shard_coordinator,
        }
    }

    /// Apply `scr`. Results for receivers in other shards are ignored.
    pub fn settle(&self, scr: &SmartContractResult) -> TxProcessResult<()> {
        let receiver = self.address_converter.create_address(&scr.receiver)?;
        if self.shard_coordinator.compute_id(&receiver) != self.shard_coordinator.self_id() {
            debug!("[sn-03] Result for {} belongs to another shard", receiver);
            return Ok(());
        }

        let mut account = self.accounts.get_account_with_journal(&receiver)?;
        account.add_to_balance(scr.value);
        if !scr.code.is_empty() {
            account.set_code(scr.code.clone());
        }
        if account.is_contract() {
            for (key, value) in parse_storage_updates(&scr.data)? {
                account.set_data_value(key, value);
            }
        }
        self.accounts.save_account(&account)?;

        debug!("[sn-03] Settled result of {} for {}", scr.value, receiver);
        Ok(())
    }
}

impl SmartContractResultProcessor for ResultSettlementProcessor {
    fn process_smart_contract_result(&self, scr: &SmartContractResult) -> IntermediateResult<()> {
        self.settle(scr)
            .map_err(|e| IntermediateError::ResultRejected(e.to_string()))
    }
}
