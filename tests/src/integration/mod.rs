//! Cross-component integration flows.
//!
//! Each flow assembles the real components of one or two shards by hand,
//! with the two-shard layout: an address belongs to the shard given by the
//! parity of its last byte.

pub mod fork_flows;
pub mod ledger_flows;
pub mod settlement_flows;

use std::sync::Arc;

use primitive_types::U256;
use shared_types::{
    Address, BincodeMarshalizer, BlockType, Hasher, Keccak256Hasher, MemoryStorage, ShardId,
};
use sn_01_account_ledger::{AccountsAdapter, InMemoryAccountsDb};
use sn_02_sharding::{AddressConverter, MultiShardCoordinator, PlainAddressConverter, ShardCoordinator};
use sn_03_transaction_processing::{ResultSettlementProcessor, SettlementContractProcessor, TxProcessor};
use sn_04_intermediate_results::IntermediateResultsProcessor;

/// Ledger and processors of one shard of a two-shard network.
pub struct ShardStack {
    /// Account ledger.
    pub accounts: Arc<InMemoryAccountsDb>,
    /// Shard layout.
    pub coordinator: Arc<dyn ShardCoordinator>,
    /// Results produced for other shards.
    pub intermediate: Arc<IntermediateResultsProcessor>,
    /// Applies incoming results.
    pub settlement: Arc<ResultSettlementProcessor>,
    /// Contract handling.
    pub contracts: Arc<SettlementContractProcessor>,
    /// User transaction executor.
    pub tx_processor: TxProcessor,
    /// Persistent storage.
    pub storage: Arc<MemoryStorage>,
}

impl ShardStack {
    /// Build the stack of `self_id`.
    pub fn new(self_id: ShardId) -> Self {
        let hasher: Arc<dyn Hasher> = Arc::new(Keccak256Hasher);
        let converter: Arc<dyn AddressConverter> = Arc::new(PlainAddressConverter::default());
        let coordinator: Arc<dyn ShardCoordinator> =
            Arc::new(MultiShardCoordinator::new(2, self_id).expect("valid layout"));
        let accounts = Arc::new(InMemoryAccountsDb::new(BincodeMarshalizer, Arc::clone(&hasher)));
        let storage = Arc::new(MemoryStorage::new());

        let intermediate = Arc::new(IntermediateResultsProcessor::new(
            Arc::clone(&hasher),
            BincodeMarshalizer,
            Arc::clone(&coordinator),
            Arc::clone(&converter),
            storage.clone(),
            BlockType::SmartContractResultBlock,
        ));
        let settlement = Arc::new(ResultSettlementProcessor::new(
            accounts.clone(),
            Arc::clone(&converter),
            Arc::clone(&coordinator),
        ));
        let contracts = Arc::new(SettlementContractProcessor::new(
            accounts.clone(),
            Arc::clone(&converter),
            Arc::clone(&coordinator),
            hasher,
            BincodeMarshalizer,
            intermediate.clone(),
            Arc::clone(&settlement),
        ));
        let tx_processor = TxProcessor::new(
            accounts.clone(),
            converter,
            Arc::clone(&coordinator),
            contracts.clone(),
        );

        Self {
            accounts,
            coordinator,
            intermediate,
            settlement,
            contracts,
            tx_processor,
            storage,
        }
    }

    /// Credit `address` and commit.
    pub fn fund(&self, address: &[u8], balance: u64) {
        let mut account = self
            .accounts
            .get_account_with_journal(&Address::new(address.to_vec()))
            .expect("account");
        account.add_to_balance(U256::from(balance));
        self.accounts.save_account(&account).expect("save");
        self.accounts.commit().expect("commit");
    }

    /// Balance of `address`, zero when unknown.
    pub fn balance(&self, address: &[u8]) -> U256 {
        self.accounts
            .get_existing_account(&Address::new(address.to_vec()))
            .map(|account| account.balance)
            .unwrap_or_default()
    }
}
