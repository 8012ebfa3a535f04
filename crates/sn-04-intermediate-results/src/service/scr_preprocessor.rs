//! # Smart Contract Result Preprocessor
//!
//! Handles result mini-blocks arriving from other shards: finds which
//! results are missing from the pool, requests them, waits until they
//! arrive, then settles them against the local ledger.
//!
//! ## Waiting
//!
//! The pool add handler fills awaited entries. When the last missing result
//! lands it signals a `Notify`; `is_data_prepared` waits on it under a
//! deadline taken from the caller's time budget.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use shared_types::{
    calculate_hash, shard_cacher_identifier, BincodeMarshalizer, BlockType, Body, Hash, HashCache,
    Hasher, Marshalizer, MiniBlock, RequestHandler, ShardId, ShardedDataPool, SmartContractResult,
    StorageService, UnitType,
};
use sn_02_sharding::ShardCoordinator;
use tokio::sync::Notify;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info};

use crate::domain::{IntermediateError, IntermediateResult, TxInfo, TxShardInfo, TxsForBlock};
use crate::ports::SmartContractResultProcessor;

/// Preprocessor for incoming smart contract result mini-blocks.
pub struct SmartContractResultPreprocessor<M: Marshalizer = BincodeMarshalizer> {
    hasher: Arc<dyn Hasher>,
    marshalizer: M,
    shard_coordinator: Arc<dyn ShardCoordinator>,
    scr_pool: Arc<ShardedDataPool<SmartContractResult>>,
    storage: Arc<dyn StorageService>,
    scr_processor: Arc<dyn SmartContractResultProcessor>,
    request_handler: Arc<dyn RequestHandler>,
    scr_for_block: Arc<Mutex<TxsForBlock>>,
    all_received: Arc<Notify>,
}

impl<M: Marshalizer> SmartContractResultPreprocessor<M> {
    /// Create the preprocessor and subscribe it to the result pool.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scr_pool: Arc<ShardedDataPool<SmartContractResult>>,
        storage: Arc<dyn StorageService>,
        hasher: Arc<dyn Hasher>,
        marshalizer: M,
        scr_processor: Arc<dyn SmartContractResultProcessor>,
        shard_coordinator: Arc<dyn ShardCoordinator>,
        request_handler: Arc<dyn RequestHandler>,
    ) -> Self {
        let scr_for_block = Arc::new(Mutex::new(TxsForBlock::default()));
        let all_received = Arc::new(Notify::new());

        let registry = Arc::clone(&scr_for_block);
        let notify = Arc::clone(&all_received);
        let pool = Arc::downgrade(&scr_pool);
        scr_pool.register_handler(Arc::new(move |hash: &[u8]| {
            if let Some(pool) = pool.upgrade() {
                received_smart_contract_result(&registry, &notify, &pool, hash);
            }
        }));

        Self {
            hasher,
            marshalizer,
            shard_coordinator,
            scr_pool,
            storage,
            scr_processor,
            request_handler,
            scr_for_block,
            all_received,
        }
    }

    /// Forget every result used by the previous block.
    pub fn create_block_started(&self) {
        self.scr_for_block.lock().reset();
    }

    /// Request results referenced by result mini-blocks from other shards
    /// that are not in the pool. Returns the number requested.
    pub fn request_block_transactions(&self, body: &Body) -> usize {
        let self_id = self.shard_coordinator.self_id();
        let mut missing_by_sender: BTreeMap<ShardId, Vec<Hash>> = BTreeMap::new();

        {
            let mut registry = self.scr_for_block.lock();
            registry.missing_txs = 0;

            for mini_block in &body.mini_blocks {
                if mini_block.block_type != BlockType::SmartContractResultBlock
                    || mini_block.sender_shard_id == self_id
                {
                    continue;
                }

                let shard_info = TxShardInfo {
                    sender_shard_id: mini_block.sender_shard_id,
                    receiver_shard_id: mini_block.receiver_shard_id,
                };
                let store = self.pool_store(mini_block);

                for hash in &mini_block.tx_hashes {
                    let tx = store.as_ref().and_then(|store| store.get(hash));
                    if tx.is_none() {
                        registry.missing_txs += 1;
                        missing_by_sender
                            .entry(mini_block.sender_shard_id)
                            .or_default()
                            .push(hash.clone());
                    }
                    registry
                        .tx_hash_and_info
                        .insert(hash.clone(), TxInfo { tx, shard_info });
                }
            }
        }

        let mut requested = 0;
        for (sender_shard_id, hashes) in missing_by_sender {
            requested += hashes.len();
            self.request_handler
                .request_unsigned_transactions(sender_shard_id, &hashes);
        }
        requested
    }

    /// Wait until every requested result arrived or the time budget elapses.
    pub async fn is_data_prepared<F>(&self, requested: usize, have_time: F) -> IntermediateResult<()>
    where
        F: Fn() -> Duration,
    {
        if requested == 0 {
            return Ok(());
        }

        info!("[sn-04] Requested {} missing smart contract results", requested);
        let deadline = Instant::now() + have_time();

        let result = loop {
            if self.missing_txs() == 0 {
                break Ok(());
            }
            if timeout_at(deadline, self.all_received.notified()).await.is_err() {
                break if self.missing_txs() == 0 {
                    Ok(())
                } else {
                    Err(IntermediateError::TimeIsOut)
                };
            }
        };

        info!(
            "[sn-04] Received {} missing smart contract results",
            requested.saturating_sub(self.missing_txs())
        );
        result
    }

    /// Request the results of one mini-block missing from the pool.
    pub fn request_transactions_for_mini_block(&self, mini_block: &MiniBlock) -> usize {
        if mini_block.block_type != BlockType::SmartContractResultBlock {
            return 0;
        }

        let store = self.pool_store(mini_block);
        let missing: Vec<Hash> = mini_block
            .tx_hashes
            .iter()
            .filter(|hash| !store.as_ref().is_some_and(|store| store.has(hash)))
            .cloned()
            .collect();

        if !missing.is_empty() {
            self.request_handler
                .request_unsigned_transactions(mini_block.sender_shard_id, &missing);
        }
        missing.len()
    }

    /// Settle every result of the result mini-blocks addressed to this shard.
    pub fn process_block_transactions(
        &self,
        body: &Body,
        round: u64,
        have_time: &dyn Fn() -> bool,
    ) -> IntermediateResult<()> {
        let self_id = self.shard_coordinator.self_id();

        for mini_block in &body.mini_blocks {
            if mini_block.block_type != BlockType::SmartContractResultBlock
                || mini_block.receiver_shard_id != self_id
            {
                continue;
            }

            for hash in &mini_block.tx_hashes {
                if !have_time() {
                    return Err(IntermediateError::TimeIsOut);
                }

                let scr = self
                    .scr_for_block
                    .lock()
                    .tx_hash_and_info
                    .get(hash)
                    .and_then(|info| info.tx.clone())
                    .ok_or_else(|| IntermediateError::MissingTransaction(hex::encode(hash)))?;

                self.scr_processor.process_smart_contract_result(&scr)?;
                self.record(hash.clone(), scr, mini_block);
            }
        }

        debug!("[sn-04] Processed result mini-blocks for round {}", round);
        Ok(())
    }

    /// Settle one result mini-block whose results are all in the pool.
    pub fn process_mini_block(
        &self,
        mini_block: &MiniBlock,
        have_time: &dyn Fn() -> bool,
        round: u64,
    ) -> IntermediateResult<()> {
        if mini_block.block_type != BlockType::SmartContractResultBlock {
            return Err(IntermediateError::WrongTypeInMiniBlock(format!(
                "{:?}",
                mini_block.block_type
            )));
        }

        let cache_id =
            shard_cacher_identifier(mini_block.sender_shard_id, mini_block.receiver_shard_id);
        let store = self
            .scr_pool
            .shard_data_store(&cache_id)
            .ok_or(IntermediateError::MissingPoolStore(cache_id))?;

        let mut results = Vec::with_capacity(mini_block.tx_hashes.len());
        for hash in &mini_block.tx_hashes {
            if !have_time() {
                return Err(IntermediateError::TimeIsOut);
            }
            let scr = store
                .get(hash)
                .ok_or_else(|| IntermediateError::MissingTransaction(hex::encode(hash)))?;
            results.push((hash.clone(), scr));
        }

        for (_, scr) in &results {
            if !have_time() {
                return Err(IntermediateError::TimeIsOut);
            }
            self.scr_processor.process_smart_contract_result(scr)?;
        }

        for (hash, scr) in results {
            self.record(hash, scr, mini_block);
        }

        debug!(
            "[sn-04] Processed result mini-block from shard {} in round {}",
            mini_block.sender_shard_id, round
        );
        Ok(())
    }

    /// Persist the results of result mini-blocks addressed to this shard.
    pub fn save_tx_block_to_storage(&self, body: &Body) -> IntermediateResult<()> {
        let self_id = self.shard_coordinator.self_id();

        for mini_block in &body.mini_blocks {
            if mini_block.block_type != BlockType::SmartContractResultBlock
                || mini_block.receiver_shard_id != self_id
            {
                continue;
            }

            for hash in &mini_block.tx_hashes {
                let scr = self
                    .scr_for_block
                    .lock()
                    .tx_hash_and_info
                    .get(hash)
                    .and_then(|info| info.tx.clone())
                    .ok_or_else(|| IntermediateError::MissingTransaction(hex::encode(hash)))?;

                let buff = self.marshalizer.marshal(&scr)?;
                self.storage.put(UnitType::UnsignedTransaction, hash, buff)?;
            }
        }

        Ok(())
    }

    /// Drop the results and result mini-blocks of `body` from the pools.
    pub fn remove_tx_block_from_pools(
        &self,
        body: &Body,
        mini_block_pool: &HashCache<MiniBlock>,
    ) -> IntermediateResult<()> {
        for mini_block in result_mini_blocks(body) {
            let cache_id =
                shard_cacher_identifier(mini_block.sender_shard_id, mini_block.receiver_shard_id);
            self.scr_pool
                .remove_set_of_data_from_pool(&mini_block.tx_hashes, &cache_id);

            let hash = calculate_hash(&self.marshalizer, self.hasher.as_ref(), mini_block)?;
            mini_block_pool.remove(&hash);
        }
        Ok(())
    }

    /// Put the results and result mini-blocks of `body` back in the pools.
    ///
    /// Returns the number of restored results and the hash of each restored
    /// mini-block by its position in the body.
    pub fn restore_tx_block_into_pools(
        &self,
        body: &Body,
        mini_block_pool: &HashCache<MiniBlock>,
    ) -> IntermediateResult<(usize, BTreeMap<usize, Hash>)> {
        let mut restored = 0;
        let mut mini_block_hashes = BTreeMap::new();

        for (index, mini_block) in body.mini_blocks.iter().enumerate() {
            if mini_block.block_type != BlockType::SmartContractResultBlock {
                continue;
            }

            let cache_id =
                shard_cacher_identifier(mini_block.sender_shard_id, mini_block.receiver_shard_id);
            let buffers = self
                .storage
                .get_all(UnitType::UnsignedTransaction, &mini_block.tx_hashes)?;

            for (hash, buff) in buffers {
                let scr: SmartContractResult = self.marshalizer.unmarshal(&buff)?;
                self.scr_pool.add_data(&hash, scr, &cache_id)?;
            }

            let hash = calculate_hash(&self.marshalizer, self.hasher.as_ref(), mini_block)?;
            mini_block_pool.put(&hash, mini_block.clone())?;
            mini_block_hashes.insert(index, hash);
            restored += mini_block.tx_hashes.len();
        }

        Ok((restored, mini_block_hashes))
    }

    /// Marshal used results for broadcasting, in the given hash order.
    pub fn create_marshalized_data(&self, tx_hashes: &[Hash]) -> IntermediateResult<Vec<Vec<u8>>> {
        let registry = self.scr_for_block.lock();
        tx_hashes
            .iter()
            .map(|hash| {
                let scr = registry
                    .tx_hash_and_info
                    .get(hash)
                    .and_then(|info| info.tx.as_ref())
                    .ok_or_else(|| IntermediateError::MissingTransaction(hex::encode(hash)))?;
                Ok(self.marshalizer.marshal(scr)?)
            })
            .collect()
    }

    /// Results used by the block being created or processed.
    pub fn get_all_current_used_txs(&self) -> HashMap<Hash, SmartContractResult> {
        self.scr_for_block
            .lock()
            .tx_hash_and_info
            .iter()
            .filter_map(|(hash, info)| info.tx.clone().map(|tx| (hash.clone(), tx)))
            .collect()
    }

    fn missing_txs(&self) -> usize {
        self.scr_for_block.lock().missing_txs
    }

    fn pool_store(&self, mini_block: &MiniBlock) -> Option<Arc<HashCache<SmartContractResult>>> {
        self.scr_pool.shard_data_store(&shard_cacher_identifier(
            mini_block.sender_shard_id,
            mini_block.receiver_shard_id,
        ))
    }

    fn record(&self, hash: Hash, scr: SmartContractResult, mini_block: &MiniBlock) {
        self.scr_for_block.lock().tx_hash_and_info.insert(
            hash,
            TxInfo {
                tx: Some(scr),
                shard_info: TxShardInfo {
                    sender_shard_id: mini_block.sender_shard_id,
                    receiver_shard_id: mini_block.receiver_shard_id,
                },
            },
        );
    }
}

fn result_mini_blocks(body: &Body) -> impl Iterator<Item = &MiniBlock> {
    body.mini_blocks
        .iter()
        .filter(|mini_block| mini_block.block_type == BlockType::SmartContractResultBlock)
}

/// Pool add handler: fill an awaited entry and wake the waiter when the
/// last missing result lands.
fn received_smart_contract_result(
    registry: &Mutex<TxsForBlock>,
    notify: &Notify,
    pool: &ShardedDataPool<SmartContractResult>,
    hash: &[u8],
) {
    let all_received = {
        let mut registry = registry.lock();
        let Some(shard_info) = registry
            .tx_hash_and_info
            .get(hash)
            .filter(|info| info.tx.is_none())
            .map(|info| info.shard_info)
        else {
            return;
        };

        let cache_id =
            shard_cacher_identifier(shard_info.sender_shard_id, shard_info.receiver_shard_id);
        let Some(scr) = pool
            .shard_data_store(&cache_id)
            .and_then(|store| store.get(hash))
        else {
            return;
        };

        registry.fill_missing(hash, scr)
    };

    if all_received {
        notify.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Keccak256Hasher, MemoryStorage, MockRequestHandler, RecordedRequest, U256};
    use sn_02_sharding::MockShardCoordinator;

    use crate::ports::MockResultProcessor;

    const SELF_SHARD: ShardId = 0;

    struct Fixture {
        preprocessor: SmartContractResultPreprocessor,
        pool: Arc<ShardedDataPool<SmartContractResult>>,
        storage: Arc<MemoryStorage>,
        requests: Arc<MockRequestHandler>,
        processor: Arc<MockResultProcessor>,
    }

    fn fixture_with(processor: MockResultProcessor) -> Fixture {
        let pool = Arc::new(ShardedDataPool::new());
        let storage = Arc::new(MemoryStorage::new());
        let requests = Arc::new(MockRequestHandler::new());
        let processor = Arc::new(processor);
        let preprocessor = SmartContractResultPreprocessor::new(
            Arc::clone(&pool),
            storage.clone(),
            Arc::new(Keccak256Hasher),
            BincodeMarshalizer,
            processor.clone(),
            Arc::new(MockShardCoordinator::new(3, SELF_SHARD)),
            requests.clone(),
        );
        Fixture {
            preprocessor,
            pool,
            storage,
            requests,
            processor,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MockResultProcessor::new())
    }

    fn scr(value: u64) -> SmartContractResult {
        SmartContractResult {
            nonce: value,
            value: U256::from(value),
            receiver: vec![value as u8; 32],
            ..Default::default()
        }
    }

    fn incoming(hashes: &[&[u8]]) -> MiniBlock {
        MiniBlock {
            tx_hashes: hashes.iter().map(|h| h.to_vec()).collect(),
            sender_shard_id: 1,
            receiver_shard_id: SELF_SHARD,
            block_type: BlockType::SmartContractResultBlock,
        }
    }

    fn always() -> bool {
        true
    }

    #[test]
    fn test_request_block_transactions_requests_only_missing() {
        let f = fixture();
        f.pool.add_data(b"h1", scr(1), "_1_0").unwrap();

        let outgoing = MiniBlock {
            sender_shard_id: SELF_SHARD,
            receiver_shard_id: 1,
            ..incoming(&[b"own"])
        };
        let body = Body::new(vec![incoming(&[b"h1", b"h2"]), outgoing]);

        assert_eq!(f.preprocessor.request_block_transactions(&body), 1);
        assert_eq!(
            f.requests.requests(),
            vec![RecordedRequest::UnsignedTransactions(1, vec![b"h2".to_vec()])]
        );
        assert_eq!(f.preprocessor.get_all_current_used_txs().len(), 1);
    }

    #[tokio::test]
    async fn test_is_data_prepared_wakes_on_last_arrival() {
        let f = fixture();
        let body = Body::new(vec![incoming(&[b"h1", b"h2"])]);
        let requested = f.preprocessor.request_block_transactions(&body);
        assert_eq!(requested, 2);

        let pool = Arc::clone(&f.pool);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            pool.add_data(b"h1", scr(1), "_1_0").unwrap();
            pool.add_data(b"h2", scr(2), "_1_0").unwrap();
        });

        f.preprocessor
            .is_data_prepared(requested, || Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(f.preprocessor.get_all_current_used_txs().len(), 2);
    }

    #[tokio::test]
    async fn test_is_data_prepared_times_out() {
        let f = fixture();
        let body = Body::new(vec![incoming(&[b"h1"])]);
        let requested = f.preprocessor.request_block_transactions(&body);

        let result = f
            .preprocessor
            .is_data_prepared(requested, || Duration::from_millis(20))
            .await;
        assert!(matches!(result, Err(IntermediateError::TimeIsOut)));
    }

    #[test]
    fn test_is_data_prepared_without_requests_returns_immediately() {
        let f = fixture();
        let result = tokio_test::block_on(f.preprocessor.is_data_prepared(0, || Duration::ZERO));
        assert!(result.is_ok());
    }

    #[test]
    fn test_process_block_transactions() {
        let f = fixture();
        f.pool.add_data(b"h1", scr(1), "_1_0").unwrap();
        let body = Body::new(vec![incoming(&[b"h1"])]);
        f.preprocessor.request_block_transactions(&body);

        f.preprocessor.process_block_transactions(&body, 3, &always).unwrap();
        assert_eq!(f.processor.processed(), vec![scr(1)]);

        f.preprocessor.create_block_started();
        let result = f.preprocessor.process_block_transactions(&body, 3, &always);
        assert!(matches!(result, Err(IntermediateError::MissingTransaction(_))));

        let result = f.preprocessor.process_block_transactions(&body, 3, &|| false);
        assert!(matches!(result, Err(IntermediateError::TimeIsOut)));
    }

    #[test]
    fn test_process_block_transactions_surfaces_rejection() {
        let f = fixture_with(MockResultProcessor::rejecting());
        f.pool.add_data(b"h1", scr(1), "_1_0").unwrap();
        let body = Body::new(vec![incoming(&[b"h1"])]);
        f.preprocessor.request_block_transactions(&body);

        let result = f.preprocessor.process_block_transactions(&body, 1, &always);
        assert!(matches!(result, Err(IntermediateError::ResultRejected(_))));
    }

    #[test]
    fn test_process_mini_block() {
        let f = fixture();
        let mini_block = incoming(&[b"h1", b"h2"]);

        let wrong = MiniBlock {
            block_type: BlockType::TxBlock,
            ..mini_block.clone()
        };
        assert!(matches!(
            f.preprocessor.process_mini_block(&wrong, &always, 1),
            Err(IntermediateError::WrongTypeInMiniBlock(_))
        ));
        assert!(matches!(
            f.preprocessor.process_mini_block(&mini_block, &always, 1),
            Err(IntermediateError::MissingPoolStore(_))
        ));

        f.pool.add_data(b"h1", scr(1), "_1_0").unwrap();
        assert!(matches!(
            f.preprocessor.process_mini_block(&mini_block, &always, 1),
            Err(IntermediateError::MissingTransaction(_))
        ));
        assert!(f.processor.processed().is_empty());

        f.pool.add_data(b"h2", scr(2), "_1_0").unwrap();
        f.preprocessor.process_mini_block(&mini_block, &always, 1).unwrap();
        assert_eq!(f.processor.processed().len(), 2);
        assert_eq!(f.preprocessor.create_marshalized_data(&[b"h2".to_vec()]).unwrap().len(), 1);
    }

    #[test]
    fn test_request_transactions_for_mini_block() {
        let f = fixture();
        f.pool.add_data(b"h1", scr(1), "_1_0").unwrap();

        assert_eq!(f.preprocessor.request_transactions_for_mini_block(&incoming(&[b"h1", b"h2"])), 1);
        assert_eq!(
            f.preprocessor.request_transactions_for_mini_block(&incoming(&[b"h1"])),
            0
        );
        assert_eq!(f.requests.requests().len(), 1);
    }

    #[test]
    fn test_save_remove_restore_cycle() {
        let f = fixture();
        let mini_block_pool: HashCache<MiniBlock> = HashCache::new();
        f.pool.add_data(b"h1", scr(1), "_1_0").unwrap();
        f.pool.add_data(b"h2", scr(2), "_1_0").unwrap();
        let body = Body::new(vec![incoming(&[b"h1", b"h2"])]);

        f.preprocessor.request_block_transactions(&body);
        f.preprocessor.save_tx_block_to_storage(&body).unwrap();
        assert_eq!(f.storage.len(UnitType::UnsignedTransaction), 2);

        f.preprocessor
            .remove_tx_block_from_pools(&body, &mini_block_pool)
            .unwrap();
        assert!(f.pool.search_first_data(b"h1").is_none());

        let (restored, hashes) = f
            .preprocessor
            .restore_tx_block_into_pools(&body, &mini_block_pool)
            .unwrap();
        assert_eq!(restored, 2);
        assert_eq!(hashes.len(), 1);
        assert_eq!(f.pool.search_first_data(b"h2"), Some(scr(2)));
        assert!(mini_block_pool.has(&hashes[&0]));
    }
}
