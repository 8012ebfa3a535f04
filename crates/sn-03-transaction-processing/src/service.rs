//! # Transaction Processor
//!
//! Applies one user transaction against the local ledger.
//!
//! ## Flow
//!
//! 1. Convert sender and receiver addresses
//! 2. Load the sender only if it lives in this shard
//! 3. Check nonce and funds of a local sender
//! 4. Classify through the contract processor
//! 5. Transfer value, or hand off deployment/invocation

use std::sync::Arc;

use shared_types::{Address, Transaction};
use sn_01_account_ledger::{Account, AccountsAdapter};
use sn_02_sharding::{AddressConverter, ShardCoordinator};
use tracing::debug;

use crate::algorithms::{check_tx_values, required_funds};
use crate::domain::{TransactionType, TxProcessResult};
use crate::ports::{SmartContractProcessor, TransactionProcessor};

/// Production `TransactionProcessor`.
pub struct TxProcessor {
    accounts: Arc<dyn AccountsAdapter>,
    address_converter: Arc<dyn AddressConverter>,
    shard_coordinator: Arc<dyn ShardCoordinator>,
    sc_processor: Arc<dyn SmartContractProcessor>,
}

impl TxProcessor {
    /// Create a processor.
    pub fn new(
        accounts: Arc<dyn AccountsAdapter>,
        address_converter: Arc<dyn AddressConverter>,
        shard_coordinator: Arc<dyn ShardCoordinator>,
        sc_processor: Arc<dyn SmartContractProcessor>,
    ) -> Self {
        Self {
            accounts,
            address_converter,
            shard_coordinator,
            sc_processor,
        }
    }

    /// Journaled account for `address` if it lives in this shard.
    fn local_account(&self, address: &Address) -> TxProcessResult<Option<Account>> {
        if self.shard_coordinator.compute_id(address) != self.shard_coordinator.self_id() {
            return Ok(None);
        }
        Ok(Some(self.accounts.get_account_with_journal(address)?))
    }

    fn process_move_balance(
        &self,
        tx: &Transaction,
        sender: Option<Account>,
        receiver_address: &Address,
    ) -> TxProcessResult<()> {
        if let Some(mut sender) = sender {
            sender.sub_from_balance(required_funds(tx)?)?;
            sender.increase_nonce();

            if sender.address == *receiver_address {
                sender.add_to_balance(tx.value);
                self.accounts.save_account(&sender)?;
                return Ok(());
            }
            self.accounts.save_account(&sender)?;
        }

        if let Some(mut receiver) = self.local_account(receiver_address)? {
            receiver.add_to_balance(tx.value);
            self.accounts.save_account(&receiver)?;
        }
        Ok(())
    }
}

impl TransactionProcessor for TxProcessor {
    fn process_transaction(&self, tx: &Transaction, round: u64) -> TxProcessResult<()> {
        let sender_address = self.address_converter.create_address(&tx.sender)?;
        let receiver_address = self.address_converter.create_address(&tx.receiver)?;

        let sender = self.local_account(&sender_address)?;
        check_tx_values(tx, sender.as_ref())?;

        let tx_type = self.sc_processor.compute_transaction_type(tx)?;
        debug!(
            "[sn-03] Processing {} transaction nonce {} in round {}",
            tx_type, tx.nonce, round
        );

        match tx_type {
            TransactionType::MoveBalance => {
                self.process_move_balance(tx, sender, &receiver_address)
            }
            TransactionType::SCDeployment => {
                self.sc_processor.deploy_smart_contract(tx, sender, round)
            }
            TransactionType::SCInvoking => {
                let receiver = self.local_account(&receiver_address)?;
                self.sc_processor
                    .execute_smart_contract_transaction(tx, sender, receiver, round)
            }
        }
    }
}
