//! Settlement Contract Processor
//!
//! Contract handling at the account level, without bytecode execution:
//! deployment installs the code on a new account in the sender's shard and
//! an invocation turns into a smart contract result carrying the value and
//! call data to the contract.

use std::sync::Arc;

use shared_types::{
    calculate_hash, Address, AnyTransaction, BincodeMarshalizer, Hasher, Marshalizer,
    SmartContractResult, Transaction,
};
use sn_01_account_ledger::{Account, AccountsAdapter, VmAccountsView};
use sn_02_sharding::{AddressConverter, ShardCoordinator};
use sn_04_intermediate_results::IntermediateTransactionHandler;
use tracing::{debug, info};

use crate::adapters::ResultSettlementProcessor;
use crate::algorithms::{classify_transaction, required_funds};
use crate::domain::{TransactionType, TxProcessResult};
use crate::ports::SmartContractProcessor;

/// Trailing address bytes copied from the deployer, so the contract maps to
/// the deployer's shard.
const SHARD_SUFFIX_LEN: usize = 8;

/// Account-level `SmartContractProcessor`.
pub struct SettlementContractProcessor<M: Marshalizer = BincodeMarshalizer> {
    accounts: Arc<dyn AccountsAdapter>,
    vm_view: VmAccountsView,
    address_converter: Arc<dyn AddressConverter>,
    shard_coordinator: Arc<dyn ShardCoordinator>,
    hasher: Arc<dyn Hasher>,
    marshalizer: M,
    intermediate: Arc<dyn IntermediateTransactionHandler>,
    settlement: Arc<ResultSettlementProcessor>,
}

impl<M: Marshalizer> SettlementContractProcessor<M> {
    /// Create the processor.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        accounts: Arc<dyn AccountsAdapter>,
        address_converter: Arc<dyn AddressConverter>,
        shard_coordinator: Arc<dyn ShardCoordinator>,
        hasher: Arc<dyn Hasher>,
        marshalizer: M,
        intermediate: Arc<dyn IntermediateTransactionHandler>,
        settlement: Arc<ResultSettlementProcessor>,
    ) -> Self {
        Self {
            vm_view: VmAccountsView::new(Arc::clone(&accounts)),
            accounts,
            address_converter,
            shard_coordinator,
            hasher,
            marshalizer,
            intermediate,
            settlement,
        }
    }

    /// Address of the contract deployed by `deployer` with `nonce`.
    pub fn contract_address(&self, deployer: &Address, nonce: u64) -> Address {
        let mut seed = deployer.as_bytes().to_vec();
        seed.extend_from_slice(&nonce.to_be_bytes());
        let digest = self.hasher.compute(&seed);

        let len = deployer.len();
        let mut bytes: Vec<u8> = digest.iter().cycle().take(len).copied().collect();
        let keep = len.min(SHARD_SUFFIX_LEN);
        bytes[len - keep..].copy_from_slice(&deployer.as_bytes()[len - keep..]);
        Address::new(bytes)
    }

    fn charge_sender(&self, tx: &Transaction, mut sender: Account) -> TxProcessResult<()> {
        sender.sub_from_balance(required_funds(tx)?)?;
        sender.increase_nonce();
        self.accounts.save_account(&sender)?;
        Ok(())
    }
}

impl<M: Marshalizer> SmartContractProcessor for SettlementContractProcessor<M> {
    fn compute_transaction_type(&self, tx: &Transaction) -> TxProcessResult<TransactionType> {
        if tx.receiver.iter().all(|b| *b == 0) {
            return classify_transaction(tx, false, false);
        }

        let receiver = self.address_converter.create_address(&tx.receiver)?;
        let is_local =
            self.shard_coordinator.compute_id(&receiver) == self.shard_coordinator.self_id();
        let is_contract = is_local && !self.vm_view.is_code_empty(&receiver)?;
        classify_transaction(tx, is_local, is_contract)
    }

    fn deploy_smart_contract(
        &self,
        tx: &Transaction,
        sender: Option<Account>,
        round: u64,
    ) -> TxProcessResult<()> {
        let Some(sender) = sender else {
            debug!("[sn-03] Deployment from a remote sender, nothing to apply");
            return Ok(());
        };

        let address = self.contract_address(&sender.address, tx.nonce);
        self.charge_sender(tx, sender)?;

        let mut contract = self.accounts.get_account_with_journal(&address)?;
        contract.set_code(tx.data.clone());
        contract.add_to_balance(tx.value);
        self.accounts.save_account(&contract)?;

        info!("[sn-03] Deployed contract {} in round {}", address, round);
        Ok(())
    }

    fn execute_smart_contract_transaction(
        &self,
        tx: &Transaction,
        sender: Option<Account>,
        receiver: Option<Account>,
        round: u64,
    ) -> TxProcessResult<()> {
        // Cross-shard calls reach the contract as results from the sender shard
        let Some(sender) = sender else {
            debug!("[sn-03] Call from a remote sender is settled through results");
            return Ok(());
        };

        self.charge_sender(tx, sender)?;

        let scr = SmartContractResult {
            nonce: tx.nonce,
            value: tx.value,
            receiver: tx.receiver.clone(),
            sender: tx.sender.clone(),
            code: Vec::new(),
            data: tx.data.clone(),
            tx_hash: calculate_hash(&self.marshalizer, self.hasher.as_ref(), tx)?,
        };

        if receiver.is_some() {
            self.settlement.settle(&scr)?;
        } else {
            self.intermediate
                .add_intermediate_transactions(&[AnyTransaction::Scr(scr)])?;
            debug!("[sn-03] Filed cross-shard result in round {}", round);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{BlockType, Keccak256Hasher, MemoryStorage, U256};
    use sn_01_account_ledger::InMemoryAccountsDb;
    use sn_02_sharding::{MockShardCoordinator, PlainAddressConverter};
    use sn_04_intermediate_results::IntermediateResultsProcessor;

    const REMOTE: [u8; 32] = [9; 32];

    struct Fixture {
        processor: SettlementContractProcessor,
        accounts: Arc<InMemoryAccountsDb>,
        intermediate: Arc<IntermediateResultsProcessor>,
    }

    fn fixture() -> Fixture {
        let accounts = Arc::new(InMemoryAccountsDb::new(BincodeMarshalizer, Arc::new(Keccak256Hasher)));
        let coordinator = MockShardCoordinator::new(2, 0);
        coordinator.assign(&REMOTE, 1);
        let coordinator: Arc<dyn ShardCoordinator> = Arc::new(coordinator);
        let converter: Arc<dyn AddressConverter> = Arc::new(PlainAddressConverter::default());

        let intermediate = Arc::new(IntermediateResultsProcessor::new(
            Arc::new(Keccak256Hasher),
            BincodeMarshalizer,
            Arc::clone(&coordinator),
            Arc::clone(&converter),
            Arc::new(MemoryStorage::new()),
            BlockType::SmartContractResultBlock,
        ));
        let settlement = Arc::new(ResultSettlementProcessor::new(
            accounts.clone(),
            Arc::clone(&converter),
            Arc::clone(&coordinator),
        ));
        let processor = SettlementContractProcessor::new(
            accounts.clone(),
            converter,
            coordinator,
            Arc::new(Keccak256Hasher),
            BincodeMarshalizer,
            intermediate.clone(),
            settlement,
        );
        Fixture {
            processor,
            accounts,
            intermediate,
        }
    }

    fn funded_sender(accounts: &InMemoryAccountsDb, balance: u64) -> Account {
        let mut account = accounts
            .get_account_with_journal(&Address::new(vec![1; 32]))
            .unwrap();
        account.add_to_balance(U256::from(balance));
        accounts.save_account(&account).unwrap();
        account
    }

    #[test]
    fn test_deploy_creates_contract_in_sender_shard() {
        let f = fixture();
        let sender = funded_sender(&f.accounts, 100);
        let tx = Transaction {
            value: U256::from(10),
            sender: vec![1; 32],
            receiver: vec![0; 32],
            data: b"code".to_vec(),
            gas_price: 1,
            gas_limit: 5,
            ..Default::default()
        };

        assert_eq!(
            f.processor.compute_transaction_type(&tx).unwrap(),
            TransactionType::SCDeployment
        );
        f.processor.deploy_smart_contract(&tx, Some(sender.clone()), 1).unwrap();

        let address = f.processor.contract_address(&sender.address, 0);
        assert_eq!(&address.as_bytes()[24..], &sender.address.as_bytes()[24..]);
        let contract = f.accounts.get_existing_account(&address).unwrap();
        assert_eq!(contract.code, b"code".to_vec());
        assert_eq!(contract.balance, U256::from(10));

        let sender = f.accounts.get_existing_account(&sender.address).unwrap();
        assert_eq!(sender.balance, U256::from(85));
        assert_eq!(sender.nonce, 1);
    }

    #[test]
    fn test_local_invocation_settles_immediately() {
        let f = fixture();
        let contract_address = Address::new(vec![5; 32]);
        let mut contract = Account::new(contract_address.clone());
        contract.set_code(b"code".to_vec());
        f.accounts.save_account(&contract).unwrap();
        let sender = funded_sender(&f.accounts, 50);

        let tx = Transaction {
            value: U256::from(7),
            sender: vec![1; 32],
            receiver: vec![5; 32],
            data: b"6b@76".to_vec(),
            ..Default::default()
        };
        assert_eq!(
            f.processor.compute_transaction_type(&tx).unwrap(),
            TransactionType::SCInvoking
        );
        f.processor
            .execute_smart_contract_transaction(&tx, Some(sender), Some(contract), 2)
            .unwrap();

        let contract = f.accounts.get_existing_account(&contract_address).unwrap();
        assert_eq!(contract.balance, U256::from(7));
        assert_eq!(contract.data_value(b"k"), Some(&b"v"[..]));
        assert!(f.intermediate.is_empty());
    }

    #[test]
    fn test_remote_invocation_files_result() {
        let f = fixture();
        let sender = funded_sender(&f.accounts, 50);
        let tx = Transaction {
            value: U256::from(7),
            sender: vec![1; 32],
            receiver: REMOTE.to_vec(),
            data: b"call".to_vec(),
            ..Default::default()
        };

        assert_eq!(
            f.processor.compute_transaction_type(&tx).unwrap(),
            TransactionType::SCInvoking
        );
        f.processor
            .execute_smart_contract_transaction(&tx, Some(sender), None, 2)
            .unwrap();

        let mini_blocks = f.intermediate.create_all_inter_mini_blocks();
        assert_eq!(mini_blocks[&1].tx_hashes.len(), 1);
        let sender = f.accounts.get_existing_account(&Address::new(vec![1; 32])).unwrap();
        assert_eq!(sender.balance, U256::from(43));
    }

    #[test]
    fn test_remote_sender_is_noop() {
        let f = fixture();
        let tx = Transaction {
            receiver: vec![5; 32],
            data: b"call".to_vec(),
            ..Default::default()
        };
        f.processor
            .execute_smart_contract_transaction(&tx, None, None, 1)
            .unwrap();
        f.processor.deploy_smart_contract(&tx, None, 1).unwrap();
        assert!(f.accounts.is_empty());
    }
}
