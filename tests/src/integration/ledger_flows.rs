//! # Ledger Flows
//!
//! Transaction processing against a real ledger within one shard:
//! transfers, contract deployment and invocation, and rollback of a
//! partially applied batch through the journal.

#[cfg(test)]
mod tests {
    use primitive_types::U256;
    use proptest::prelude::*;
    use shared_types::{Address, Transaction};
    use sn_01_account_ledger::AccountsAdapter;
    use sn_03_transaction_processing::{encode_storage_updates, TransactionProcessor, TxProcessError};

    use crate::integration::ShardStack;

    const ALICE: [u8; 32] = [2; 32];
    const BOB: [u8; 32] = [4; 32];
    const INITIAL: u64 = 10_000;
    const FEE: u64 = 10;

    fn tx(nonce: u64, receiver: &[u8], value: u64, data: Vec<u8>) -> Transaction {
        Transaction {
            nonce,
            value: U256::from(value),
            sender: ALICE.to_vec(),
            receiver: receiver.to_vec(),
            gas_price: 1,
            gas_limit: FEE,
            data,
            ..Default::default()
        }
    }

    // =========================================================================
    // TRANSFERS
    // =========================================================================

    #[test]
    fn test_local_transfers_move_value_and_burn_fees() {
        let shard = ShardStack::new(0);
        shard.fund(&ALICE, INITIAL);

        shard.tx_processor.process_transaction(&tx(0, &BOB, 100, vec![]), 1).unwrap();
        shard.tx_processor.process_transaction(&tx(1, &BOB, 50, vec![]), 1).unwrap();

        assert_eq!(shard.balance(&ALICE), U256::from(INITIAL - 150 - 2 * FEE));
        assert_eq!(shard.balance(&BOB), U256::from(150));
    }

    #[test]
    fn test_wrong_nonce_leaves_ledger_untouched() {
        let shard = ShardStack::new(0);
        shard.fund(&ALICE, INITIAL);
        let root = shard.accounts.root_hash().unwrap();

        let result = shard.tx_processor.process_transaction(&tx(3, &BOB, 1, vec![]), 1);

        assert!(matches!(
            result,
            Err(TxProcessError::HigherNonceInTransaction { .. })
        ));
        assert_eq!(shard.accounts.root_hash().unwrap(), root);
        assert_eq!(shard.accounts.journal_len(), 0);
    }

    #[test]
    fn test_revert_drops_partial_batch() {
        let shard = ShardStack::new(0);
        shard.fund(&ALICE, INITIAL);
        let root = shard.accounts.root_hash().unwrap();

        shard.tx_processor.process_transaction(&tx(0, &BOB, 10, vec![]), 1).unwrap();
        let snapshot = shard.accounts.journal_len();
        shard.tx_processor.process_transaction(&tx(1, &BOB, 20, vec![]), 1).unwrap();

        shard.accounts.revert_to_snapshot(snapshot).unwrap();
        assert_eq!(shard.balance(&BOB), U256::from(10));

        shard.accounts.revert_to_snapshot(0).unwrap();
        assert_eq!(shard.accounts.root_hash().unwrap(), root);
        assert_eq!(shard.balance(&BOB), U256::zero());
    }

    // =========================================================================
    // CONTRACTS
    // =========================================================================

    #[test]
    fn test_deploy_then_invoke_updates_contract_storage() {
        let shard = ShardStack::new(0);
        shard.fund(&ALICE, INITIAL);

        shard
            .tx_processor
            .process_transaction(&tx(0, &[0; 32], 5, b"wasm".to_vec()), 1)
            .unwrap();
        let contract = shard
            .contracts
            .contract_address(&Address::new(ALICE.to_vec()), 0);
        assert_eq!(shard.coordinator.compute_id(&contract), 0);

        let call = encode_storage_updates(&[(b"owner".to_vec(), b"alice".to_vec())]);
        shard
            .tx_processor
            .process_transaction(&tx(1, contract.as_bytes(), 7, call), 2)
            .unwrap();

        let account = shard.accounts.get_existing_account(&contract).unwrap();
        assert!(account.is_contract());
        assert_eq!(account.balance, U256::from(12));
        assert_eq!(account.data_value(b"owner"), Some(&b"alice"[..]));
        assert!(shard.intermediate.is_empty());
    }

    #[test]
    fn test_deploy_without_code_is_rejected() {
        let shard = ShardStack::new(0);
        shard.fund(&ALICE, INITIAL);

        let result = shard
            .tx_processor
            .process_transaction(&tx(0, &[0; 32], 5, vec![]), 1);

        assert!(result.is_err());
        assert_eq!(shard.balance(&ALICE), U256::from(INITIAL));
    }

    // =========================================================================
    // PROPERTIES
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Value is only ever moved or burned as fees, never created.
        #[test]
        fn prop_transfers_conserve_value(values in prop::collection::vec(1u64..500, 1..12)) {
            let shard = ShardStack::new(0);
            shard.fund(&ALICE, INITIAL);

            let mut applied = 0u64;
            for (round, value) in values.iter().enumerate() {
                if shard
                    .tx_processor
                    .process_transaction(&tx(applied, &BOB, *value, vec![]), round as u64)
                    .is_ok()
                {
                    applied += 1;
                }
            }

            let total = shard.balance(&ALICE) + shard.balance(&BOB) + U256::from(applied * FEE);
            prop_assert_eq!(total, U256::from(INITIAL));
        }
    }
}
