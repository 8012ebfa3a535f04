//! # Settlement Flows
//!
//! A contract call crosses shards as a smart contract result:
//!
//! ```text
//! shard 0: call tx ──→ sender charged ──→ result filed ──→ SCR mini-block 0→1
//!                                                               │
//! shard 1:                       receiver credited ←── result settled
//! ```

#[cfg(test)]
mod tests {
    use primitive_types::U256;
    use shared_types::{
        Address, BincodeMarshalizer, Body, BlockType, Marshalizer, MiniBlock, SmartContractResult,
        Transaction, UnitType,
    };
    use sn_01_account_ledger::AccountsAdapter;
    use sn_03_transaction_processing::{encode_storage_updates, TransactionProcessor};
    use sn_04_intermediate_results::{IntermediateTransactionHandler, SmartContractResultProcessor};

    use crate::integration::ShardStack;

    const ALICE: [u8; 32] = [2; 32];
    const CAROL: [u8; 32] = [3; 32];
    const DAVE: [u8; 32] = [5; 32];
    const INITIAL: u64 = 10_000;
    const FEE: u64 = 10;

    fn call(sender: [u8; 32], nonce: u64, receiver: &[u8], value: u64, data: Vec<u8>) -> Transaction {
        Transaction {
            nonce,
            value: U256::from(value),
            sender: sender.to_vec(),
            receiver: receiver.to_vec(),
            gas_price: 1,
            gas_limit: FEE,
            data,
            ..Default::default()
        }
    }

    /// Results shard 0 produced for shard 1, as shard 1 would receive them.
    fn results_for_shard_one(source: &ShardStack) -> (MiniBlock, Vec<SmartContractResult>) {
        let mut mini_blocks = source.intermediate.create_all_inter_mini_blocks();
        let mini_block = mini_blocks.remove(&1).expect("mini-block for shard 1");
        let results = source
            .intermediate
            .create_marshalized_data(&mini_block.tx_hashes)
            .unwrap()
            .iter()
            .map(|buff| BincodeMarshalizer.unmarshal(buff).unwrap())
            .collect();
        (mini_block, results)
    }

    #[test]
    fn test_cross_shard_call_settles_in_destination() {
        let source = ShardStack::new(0);
        let destination = ShardStack::new(1);
        source.fund(&ALICE, INITIAL);

        source
            .tx_processor
            .process_transaction(&call(ALICE, 0, &CAROL, 40, b"ping".to_vec()), 1)
            .unwrap();
        assert_eq!(source.balance(&ALICE), U256::from(INITIAL - 40 - FEE));
        assert!(source
            .accounts
            .get_existing_account(&Address::new(CAROL.to_vec()))
            .is_err());

        let (mini_block, results) = results_for_shard_one(&source);
        assert_eq!(mini_block.block_type, BlockType::SmartContractResultBlock);
        assert_eq!((mini_block.sender_shard_id, mini_block.receiver_shard_id), (0, 1));
        assert_eq!(results.len(), 1);

        for scr in &results {
            destination.settlement.process_smart_contract_result(scr).unwrap();
        }
        assert_eq!(destination.balance(&CAROL), U256::from(40));
    }

    #[test]
    fn test_cross_shard_call_updates_remote_contract() {
        let source = ShardStack::new(0);
        let destination = ShardStack::new(1);
        source.fund(&ALICE, INITIAL);
        destination.fund(&DAVE, INITIAL);

        destination
            .tx_processor
            .process_transaction(&call(DAVE, 0, &[0; 32], 0, b"wasm".to_vec()), 1)
            .unwrap();
        let contract = destination
            .contracts
            .contract_address(&Address::new(DAVE.to_vec()), 0);
        assert_eq!(destination.coordinator.compute_id(&contract), 1);

        let data = encode_storage_updates(&[(b"caller".to_vec(), ALICE.to_vec())]);
        source
            .tx_processor
            .process_transaction(&call(ALICE, 0, contract.as_bytes(), 3, data), 2)
            .unwrap();

        let (_, results) = results_for_shard_one(&source);
        for scr in &results {
            destination.settlement.process_smart_contract_result(scr).unwrap();
        }

        let account = destination.accounts.get_existing_account(&contract).unwrap();
        assert_eq!(account.balance, U256::from(3));
        assert_eq!(account.data_value(b"caller"), Some(&ALICE[..]));
    }

    #[test]
    fn test_results_for_other_shards_are_ignored() {
        let source = ShardStack::new(0);
        let scr = SmartContractResult {
            value: U256::from(9),
            receiver: CAROL.to_vec(),
            ..Default::default()
        };

        source.settlement.process_smart_contract_result(&scr).unwrap();

        assert_eq!(source.accounts.journal_len(), 0);
        assert_eq!(source.balance(&CAROL), U256::zero());
    }

    #[test]
    fn test_produced_mini_block_verifies_and_persists() {
        let source = ShardStack::new(0);
        source.fund(&ALICE, INITIAL);
        source
            .tx_processor
            .process_transaction(&call(ALICE, 0, &CAROL, 1, b"x".to_vec()), 1)
            .unwrap();

        let (mini_block, _) = results_for_shard_one(&source);
        let body = Body::new(vec![mini_block.clone()]);
        source.intermediate.verify_inter_mini_blocks(&body).unwrap();

        let mut tampered = mini_block;
        tampered.tx_hashes.push(vec![7; 32]);
        assert!(source
            .intermediate
            .verify_inter_mini_blocks(&Body::new(vec![tampered]))
            .is_err());

        source.intermediate.save_current_intermediate_tx_to_storage().unwrap();
        assert_eq!(source.storage.len(UnitType::UnsignedTransaction), 1);
    }
}
