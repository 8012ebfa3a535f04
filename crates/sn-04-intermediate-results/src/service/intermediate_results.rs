//! # Intermediate Results Processor
//!
//! Files smart contract results produced during one block and packages the
//! cross-shard ones into deterministic mini-blocks.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::{
    calculate_hash, AnyTransaction, BincodeMarshalizer, BlockType, Body, Hash, Hasher,
    Marshalizer, MiniBlock, ShardId, StorageService, UnitType,
};
use sn_02_sharding::{AddressConverter, ShardCoordinator};
use tracing::{debug, error};

use crate::algorithms::build_cross_shard_mini_blocks;
use crate::domain::{IntermediateError, IntermediateResult, TxInfo, TxShardInfo};
use crate::ports::IntermediateTransactionHandler;

/// Aggregator of results destined to other shards.
pub struct IntermediateResultsProcessor<M: Marshalizer = BincodeMarshalizer> {
    hasher: Arc<dyn Hasher>,
    marshalizer: M,
    shard_coordinator: Arc<dyn ShardCoordinator>,
    address_converter: Arc<dyn AddressConverter>,
    storage: Arc<dyn StorageService>,
    block_type: BlockType,
    results_for_block: Mutex<HashMap<Hash, TxInfo>>,
}

impl<M: Marshalizer> IntermediateResultsProcessor<M> {
    /// Create an aggregator stamping mini-blocks with `block_type`.
    pub fn new(
        hasher: Arc<dyn Hasher>,
        marshalizer: M,
        shard_coordinator: Arc<dyn ShardCoordinator>,
        address_converter: Arc<dyn AddressConverter>,
        storage: Arc<dyn StorageService>,
        block_type: BlockType,
    ) -> Self {
        Self {
            hasher,
            marshalizer,
            shard_coordinator,
            address_converter,
            storage,
            block_type,
            results_for_block: Mutex::new(HashMap::new()),
        }
    }

    /// Number of results filed for the current block.
    pub fn len(&self) -> usize {
        self.results_for_block.lock().len()
    }

    /// Returns true if nothing was filed for the current block.
    pub fn is_empty(&self) -> bool {
        self.results_for_block.lock().is_empty()
    }

    fn shard_ids(&self, sender: &[u8], receiver: &[u8]) -> IntermediateResult<TxShardInfo> {
        let sender = self.address_converter.create_address(sender)?;
        let receiver = self.address_converter.create_address(receiver)?;
        Ok(TxShardInfo {
            sender_shard_id: self.shard_coordinator.compute_id(&sender),
            receiver_shard_id: self.shard_coordinator.compute_id(&receiver),
        })
    }

    fn mini_blocks_from(&self, results: &HashMap<Hash, TxInfo>) -> BTreeMap<ShardId, MiniBlock> {
        build_cross_shard_mini_blocks(
            self.shard_coordinator.self_id(),
            self.block_type,
            results
                .iter()
                .map(|(hash, info)| (hash, info.shard_info.receiver_shard_id)),
        )
    }
}

impl<M: Marshalizer> IntermediateTransactionHandler for IntermediateResultsProcessor<M> {
    fn add_intermediate_transactions(&self, txs: &[AnyTransaction]) -> IntermediateResult<()> {
        let mut results = self.results_for_block.lock();

        for tx in txs {
            let AnyTransaction::Scr(scr) = tx else {
                return Err(IntermediateError::WrongTypeAssertion);
            };

            let hash = calculate_hash(&self.marshalizer, self.hasher.as_ref(), scr)?;
            let shard_info = self.shard_ids(&scr.sender, &scr.receiver)?;
            results.insert(
                hash,
                TxInfo {
                    tx: Some(scr.clone()),
                    shard_info,
                },
            );
        }

        Ok(())
    }

    fn create_all_inter_mini_blocks(&self) -> BTreeMap<ShardId, MiniBlock> {
        let results = self.results_for_block.lock();
        self.mini_blocks_from(&results)
    }

    fn verify_inter_mini_blocks(&self, body: &Body) -> IntermediateResult<()> {
        let created = self.create_all_inter_mini_blocks();
        let self_id = self.shard_coordinator.self_id();

        for mini_block in &body.mini_blocks {
            if mini_block.block_type != self.block_type || mini_block.receiver_shard_id == self_id {
                continue;
            }

            let receiver = mini_block.receiver_shard_id;
            let expected = created
                .get(&receiver)
                .ok_or(IntermediateError::NilMiniBlocks(receiver))?;

            let created_hash = calculate_hash(&self.marshalizer, self.hasher.as_ref(), expected)?;
            let received_hash = calculate_hash(&self.marshalizer, self.hasher.as_ref(), mini_block)?;
            if created_hash != received_hash {
                return Err(IntermediateError::MiniBlockHashMismatch(receiver));
            }
        }

        Ok(())
    }

    fn save_current_intermediate_tx_to_storage(&self) -> IntermediateResult<()> {
        let results = self.results_for_block.lock();

        for (hash, info) in results.iter() {
            let Some(scr) = &info.tx else {
                return Err(IntermediateError::MissingTransaction(hex::encode(hash)));
            };

            let buff = self.marshalizer.marshal(scr)?;
            let key = self.hasher.compute(&buff);
            if let Err(e) = self.storage.put(UnitType::UnsignedTransaction, &key, buff) {
                error!("[sn-04] Failed to persist result {}: {}", hex::encode(&key), e);
            }
        }

        debug!("[sn-04] Saved {} intermediate results", results.len());
        Ok(())
    }

    fn create_block_started(&self) {
        self.results_for_block.lock().clear();
    }

    fn create_marshalized_data(&self, tx_hashes: &[Hash]) -> IntermediateResult<Vec<Vec<u8>>> {
        let results = self.results_for_block.lock();

        tx_hashes
            .iter()
            .map(|hash| {
                let scr = results
                    .get(hash)
                    .and_then(|info| info.tx.as_ref())
                    .ok_or_else(|| IntermediateError::MissingTransaction(hex::encode(hash)))?;
                Ok(self.marshalizer.marshal(scr)?)
            })
            .collect()
    }
}
