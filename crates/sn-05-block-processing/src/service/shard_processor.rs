//! # Shard Block Processor
//!
//! Builds, executes and commits shard blocks on top of the account ledger.
//!
//! ## Execution
//!
//! A received block is checked against the chain tip, its results from
//! other shards are fetched, then its transaction mini-blocks and incoming
//! result mini-blocks run against the ledger. The intermediate mini-blocks
//! the execution produced must match the body and the resulting state root
//! must match the header. Any failure rolls the ledger back to where the
//! block started.
//!
//! ## Timeouts
//!
//! A header whose results keep timing out is dropped from the fork detector
//! after `max_requests_with_timeout` consecutive attempts, so the node stops
//! trying to sync on it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use shared_types::{
    calculate_hash, shard_cacher_identifier, BincodeMarshalizer, BlockType, Body, Hash, HashCache,
    Hasher, Header, HeaderState, Marshalizer, MiniBlock, MiniBlockHeader, RequestHandler,
    ShardHeader, ShardId, ShardedDataPool, StorageService, Transaction, UnitType,
    MAX_GAS_LIMIT_PER_MINI_BLOCK, MAX_ITEMS_IN_BLOCK, MAX_REQUESTS_WITH_TIMEOUT_ALLOWED,
};
use sn_01_account_ledger::AccountsAdapter;
use sn_02_sharding::ShardCoordinator;
use sn_03_transaction_processing::TransactionProcessor;
use sn_04_intermediate_results::{IntermediateTransactionHandler, SmartContractResultPreprocessor};
use sn_06_fork_detection::ForkDetector;
use tracing::{debug, error, info, warn};

use crate::domain::{BlockChain, BlockError, BlockResult};
use crate::service::BlockValidator;

/// Limits applied while building and processing blocks.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Maximum transactions and results in one block.
    pub max_items_in_block: usize,
    /// Maximum gas accumulated in one transaction mini-block.
    pub max_gas_per_mini_block: u64,
    /// Consecutive timeouts tolerated before a header is dropped.
    pub max_requests_with_timeout: u32,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_items_in_block: MAX_ITEMS_IN_BLOCK,
            max_gas_per_mini_block: MAX_GAS_LIMIT_PER_MINI_BLOCK,
            max_requests_with_timeout: MAX_REQUESTS_WITH_TIMEOUT_ALLOWED,
        }
    }
}

/// Cross-shard data of a committed block, grouped by destination shard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastData {
    /// Marshaled mini-blocks per destination shard.
    pub mini_blocks: BTreeMap<ShardId, Vec<Vec<u8>>>,
    /// Marshaled user transactions per destination shard.
    pub transactions: BTreeMap<ShardId, Vec<Vec<u8>>>,
    /// Marshaled smart contract results per destination shard.
    pub results: BTreeMap<ShardId, Vec<Vec<u8>>>,
}

/// Collaborators of the shard block processor.
pub struct ProcessorComponents<M: Marshalizer = BincodeMarshalizer> {
    /// Ledger the blocks execute against.
    pub accounts: Arc<dyn AccountsAdapter>,
    /// Validity and notarization checks.
    pub validator: Arc<BlockValidator<M>>,
    /// Executes user transactions.
    pub tx_processor: Arc<dyn TransactionProcessor>,
    /// Fetches and settles results from other shards.
    pub scr_preprocessor: Arc<SmartContractResultPreprocessor<M>>,
    /// Collects results produced for other shards.
    pub intermediate: Arc<dyn IntermediateTransactionHandler>,
    /// Receives processed headers.
    pub fork_detector: Arc<dyn ForkDetector>,
    /// Shard layout.
    pub shard_coordinator: Arc<dyn ShardCoordinator>,
    /// Pool of user transactions.
    pub tx_pool: Arc<ShardedDataPool<Transaction>>,
    /// Pool of mini-blocks.
    pub mini_block_pool: Arc<HashCache<MiniBlock>>,
    /// Persistent storage.
    pub storage: Arc<dyn StorageService>,
    /// Requests for missing data.
    pub request_handler: Arc<dyn RequestHandler>,
    /// Hasher for identities.
    pub hasher: Arc<dyn Hasher>,
    /// Canonical codec.
    pub marshalizer: M,
}

/// Block producer and executor for a regular shard.
pub struct ShardBlockProcessor<M: Marshalizer = BincodeMarshalizer> {
    config: ProcessorConfig,
    accounts: Arc<dyn AccountsAdapter>,
    validator: Arc<BlockValidator<M>>,
    tx_processor: Arc<dyn TransactionProcessor>,
    scr_preprocessor: Arc<SmartContractResultPreprocessor<M>>,
    intermediate: Arc<dyn IntermediateTransactionHandler>,
    fork_detector: Arc<dyn ForkDetector>,
    shard_coordinator: Arc<dyn ShardCoordinator>,
    tx_pool: Arc<ShardedDataPool<Transaction>>,
    mini_block_pool: Arc<HashCache<MiniBlock>>,
    storage: Arc<dyn StorageService>,
    request_handler: Arc<dyn RequestHandler>,
    hasher: Arc<dyn Hasher>,
    marshalizer: M,
    txs_for_block: Mutex<HashMap<Hash, Transaction>>,
    requests_with_timeout: Mutex<HashMap<Hash, u32>>,
}

impl<M: Marshalizer> ShardBlockProcessor<M> {
    /// Create a processor from its collaborators.
    pub fn new(components: ProcessorComponents<M>, config: ProcessorConfig) -> Self {
        Self {
            config,
            accounts: components.accounts,
            validator: components.validator,
            tx_processor: components.tx_processor,
            scr_preprocessor: components.scr_preprocessor,
            intermediate: components.intermediate,
            fork_detector: components.fork_detector,
            shard_coordinator: components.shard_coordinator,
            tx_pool: components.tx_pool,
            mini_block_pool: components.mini_block_pool,
            storage: components.storage,
            request_handler: components.request_handler,
            hasher: components.hasher,
            marshalizer: components.marshalizer,
            txs_for_block: Mutex::new(HashMap::new()),
            requests_with_timeout: Mutex::new(HashMap::new()),
        }
    }

    /// The validator used for block checks.
    pub fn validator(&self) -> &Arc<BlockValidator<M>> {
        &self.validator
    }

    /// Execute a received block against the ledger.
    ///
    /// `have_time` reports the time left in the round. On error the ledger
    /// is back where it was before the call.
    pub async fn process_block<F>(
        &self,
        chain: &BlockChain,
        header: &Header,
        body: &Body,
        have_time: F,
    ) -> BlockResult<()>
    where
        F: Fn() -> Duration,
    {
        self.validator.check_block_validity(chain, Some(header), Some(body))?;
        let Header::Shard(shard_header) = header else {
            return Err(BlockError::WrongTypeAssertion);
        };
        self.check_header_body_correlation(shard_header, body)?;

        let header_hash = self.validator.compute_header_hash(header)?;
        self.create_block_started();

        let requested = self.scr_preprocessor.request_block_transactions(body);
        if let Err(err) = self.scr_preprocessor.is_data_prepared(requested, &have_time).await {
            self.record_timeout(header, &header_hash);
            return Err(err.into());
        }

        let snapshot = self.accounts.journal_len();
        let has_time = || have_time() > Duration::ZERO;

        match self.execute_block(header, body, &has_time) {
            Ok(()) => {
                info!(
                    "[sn-05] Processed block nonce {} round {} with {} mini-blocks",
                    header.nonce(),
                    header.round(),
                    body.mini_blocks.len()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "[sn-05] Processing block nonce {} failed: {}",
                    header.nonce(),
                    err
                );
                if let Err(revert_err) = self.accounts.revert_to_snapshot(snapshot) {
                    error!("[sn-05] Reverting account state failed: {}", revert_err);
                }
                Err(err)
            }
        }
    }

    /// Build a body from the transaction pool and the results produced
    /// while executing it.
    ///
    /// Transactions are applied to the ledger as they are selected; ones
    /// that fail are reverted and left out.
    pub fn create_block_body(&self, round: u64, have_time: &dyn Fn() -> bool) -> BlockResult<Body> {
        self.create_block_started();

        let self_id = self.shard_coordinator.self_id();
        let mut mini_blocks = Vec::new();
        let mut items = 0;

        for receiver in 0..self.shard_coordinator.number_of_shards() {
            if items >= self.config.max_items_in_block || !have_time() {
                break;
            }
            let cache_id = shard_cacher_identifier(self_id, receiver);
            let Some(store) = self.tx_pool.shard_data_store(&cache_id) else {
                continue;
            };

            let mut candidates: Vec<(Hash, Transaction)> = store
                .keys()
                .into_iter()
                .filter_map(|hash| store.get(&hash).map(|tx| (hash, tx)))
                .collect();
            candidates.sort_by(|(hash_a, tx_a), (hash_b, tx_b)| {
                (&tx_a.sender, tx_a.nonce, hash_a).cmp(&(&tx_b.sender, tx_b.nonce, hash_b))
            });

            let mut mini_block = MiniBlock {
                tx_hashes: Vec::new(),
                sender_shard_id: self_id,
                receiver_shard_id: receiver,
                block_type: BlockType::TxBlock,
            };
            let mut gas_used = 0u64;

            for (hash, tx) in candidates {
                if items >= self.config.max_items_in_block || !have_time() {
                    break;
                }
                let gas_after = gas_used.saturating_add(tx.gas_limit);
                if gas_after > self.config.max_gas_per_mini_block {
                    continue;
                }

                let snapshot = self.accounts.journal_len();
                if let Err(err) = self.tx_processor.process_transaction(&tx, round) {
                    debug!(
                        "[sn-05] Skipping transaction {}: {}",
                        hex::encode(&hash),
                        err
                    );
                    self.accounts.revert_to_snapshot(snapshot)?;
                    continue;
                }

                gas_used = gas_after;
                items += 1;
                mini_block.tx_hashes.push(hash.clone());
                self.txs_for_block.lock().insert(hash, tx);
            }

            if !mini_block.tx_hashes.is_empty() {
                mini_blocks.push(mini_block);
            }
        }

        mini_blocks.extend(self.intermediate.create_all_inter_mini_blocks().into_values());

        debug!(
            "[sn-05] Created body with {} mini-blocks and {} transactions for round {}",
            mini_blocks.len(),
            items,
            round
        );
        Ok(Body::new(mini_blocks))
    }

    /// Build an unsigned header for `body` on top of the chain tip.
    pub fn create_block_header(
        &self,
        chain: &BlockChain,
        body: &Body,
        round: u64,
        timestamp: u64,
    ) -> BlockResult<Header> {
        let (nonce, prev_hash, prev_rand_seed) = match chain.current_header() {
            Some(current) => (
                current.nonce() + 1,
                self.validator.compute_header_hash(&current)?,
                current.rand_seed().to_vec(),
            ),
            None => (
                0,
                chain.genesis_header_hash(),
                chain
                    .genesis_header()
                    .map(|genesis| genesis.rand_seed().to_vec())
                    .unwrap_or_default(),
            ),
        };

        let mut seed_input = prev_rand_seed.clone();
        seed_input.extend_from_slice(&round.to_be_bytes());
        let rand_seed = self.hasher.compute(&seed_input);

        let mini_block_headers = self.mini_block_headers(body)?;
        let tx_count = mini_block_headers.iter().map(|mbh| mbh.tx_count).sum();

        Ok(Header::Shard(ShardHeader {
            nonce,
            round,
            prev_hash,
            prev_rand_seed,
            rand_seed,
            root_hash: self.accounts.root_hash()?,
            shard_id: self.shard_coordinator.self_id(),
            timestamp,
            mini_block_headers,
            tx_count,
            ..Default::default()
        }))
    }

    /// Persist a processed block, commit the ledger and advance the chain.
    ///
    /// On error the ledger is reverted to its last commit.
    pub fn commit_block(&self, chain: &BlockChain, header: &Header, body: &Body) -> BlockResult<()> {
        let result = self.commit_block_inner(chain, header, body);
        if let Err(err) = &result {
            error!(
                "[sn-05] Committing block nonce {} failed: {}",
                header.nonce(),
                err
            );
            self.revert_account_state();
        }
        result
    }

    /// Drop every uncommitted ledger change.
    pub fn revert_account_state(&self) {
        if let Err(err) = self.accounts.revert_to_snapshot(0) {
            error!("[sn-05] Reverting account state failed: {}", err);
        }
    }

    /// Split out what the other shards need from a block this node just
    /// processed: their mini-blocks and the items those mini-blocks name.
    pub fn marshalized_data_to_broadcast(&self, body: &Body) -> BlockResult<BroadcastData> {
        let self_id = self.shard_coordinator.self_id();
        let mut data = BroadcastData::default();
        let txs = self.txs_for_block.lock();

        for mini_block in &body.mini_blocks {
            let receiver = mini_block.receiver_shard_id;
            if receiver == self_id {
                continue;
            }

            match mini_block.block_type {
                BlockType::TxBlock => {
                    let buffers = data.transactions.entry(receiver).or_default();
                    for hash in &mini_block.tx_hashes {
                        let tx = txs
                            .get(hash)
                            .ok_or_else(|| BlockError::MissingTransaction(hex::encode(hash)))?;
                        buffers.push(self.marshalizer.marshal(tx)?);
                    }
                }
                BlockType::SmartContractResultBlock => {
                    let buffers = self.intermediate.create_marshalized_data(&mini_block.tx_hashes)?;
                    data.results.entry(receiver).or_default().extend(buffers);
                }
                _ => {}
            }
            data.mini_blocks
                .entry(receiver)
                .or_default()
                .push(self.marshalizer.marshal(mini_block)?);
        }
        Ok(data)
    }

    /// Consecutive timeouts recorded for a header.
    pub fn requests_with_timeout(&self, header_hash: &[u8]) -> u32 {
        self.requests_with_timeout
            .lock()
            .get(header_hash)
            .copied()
            .unwrap_or(0)
    }

    fn create_block_started(&self) {
        self.txs_for_block.lock().clear();
        self.scr_preprocessor.create_block_started();
        self.intermediate.create_block_started();
    }

    fn execute_block(&self, header: &Header, body: &Body, has_time: &dyn Fn() -> bool) -> BlockResult<()> {
        let txs = self.collect_block_transactions(body)?;
        for (hash, tx) in txs {
            if !has_time() {
                return Err(BlockError::TimeIsOut);
            }
            self.tx_processor.process_transaction(&tx, header.round())?;
            self.txs_for_block.lock().insert(hash, tx);
        }

        self.scr_preprocessor
            .process_block_transactions(body, header.round(), has_time)?;
        self.intermediate.verify_inter_mini_blocks(body)?;

        let root_hash = self.accounts.root_hash()?;
        if root_hash.as_slice() != header.root_hash() {
            return Err(BlockError::RootHashDoesNotMatch);
        }
        Ok(())
    }

    /// Transactions of every transaction mini-block, in body order. Missing
    /// ones are requested from their sender shard.
    fn collect_block_transactions(&self, body: &Body) -> BlockResult<Vec<(Hash, Transaction)>> {
        let mut found = Vec::new();
        let mut missing: BTreeMap<ShardId, Vec<Hash>> = BTreeMap::new();

        for mini_block in tx_mini_blocks(body) {
            let cache_id =
                shard_cacher_identifier(mini_block.sender_shard_id, mini_block.receiver_shard_id);
            let store = self.tx_pool.shard_data_store(&cache_id);

            for hash in &mini_block.tx_hashes {
                match store.as_ref().and_then(|store| store.get(hash)) {
                    Some(tx) => found.push((hash.clone(), tx)),
                    None => missing
                        .entry(mini_block.sender_shard_id)
                        .or_default()
                        .push(hash.clone()),
                }
            }
        }

        let Some(first_missing) = missing.values().flatten().next().cloned() else {
            return Ok(found);
        };
        for (shard_id, hashes) in &missing {
            self.request_handler.request_transactions(*shard_id, hashes);
        }
        Err(BlockError::MissingTransaction(hex::encode(first_missing)))
    }

    fn check_header_body_correlation(&self, header: &ShardHeader, body: &Body) -> BlockResult<()> {
        if header.mini_block_headers != self.mini_block_headers(body)? {
            return Err(BlockError::HeaderBodyMismatch);
        }
        Ok(())
    }

    fn mini_block_headers(&self, body: &Body) -> BlockResult<Vec<MiniBlockHeader>> {
        body.mini_blocks
            .iter()
            .map(|mini_block| {
                Ok(MiniBlockHeader {
                    hash: calculate_hash(&self.marshalizer, self.hasher.as_ref(), mini_block)?,
                    sender_shard_id: mini_block.sender_shard_id,
                    receiver_shard_id: mini_block.receiver_shard_id,
                    tx_count: mini_block.tx_hashes.len() as u32,
                    block_type: mini_block.block_type,
                })
            })
            .collect()
    }

    fn record_timeout(&self, header: &Header, header_hash: &[u8]) {
        let mut timeouts = self.requests_with_timeout.lock();
        let count = timeouts.entry(header_hash.to_vec()).or_insert(0);
        *count += 1;
        warn!(
            "[sn-05] Results for block nonce {} timed out ({} of {})",
            header.nonce(),
            count,
            self.config.max_requests_with_timeout
        );

        if *count >= self.config.max_requests_with_timeout {
            timeouts.remove(header_hash);
            self.fork_detector.remove_headers(header.nonce(), header_hash);
            info!(
                "[sn-05] Dropped header nonce {} after repeated timeouts",
                header.nonce()
            );
        }
    }

    fn commit_block_inner(&self, chain: &BlockChain, header: &Header, body: &Body) -> BlockResult<()> {
        let Header::Shard(_) = header else {
            return Err(BlockError::WrongTypeAssertion);
        };
        let header_hash = self.validator.compute_header_hash(header)?;

        let buff = self.marshalizer.marshal(header)?;
        self.storage.put(UnitType::BlockHeader, &header_hash, buff)?;
        self.storage.put(
            UnitType::ShardHdrNonceHash(header.shard_id()),
            &header.nonce().to_be_bytes(),
            header_hash.clone(),
        )?;

        for mini_block in &body.mini_blocks {
            let buff = self.marshalizer.marshal(mini_block)?;
            let hash = self.hasher.compute(&buff);
            self.storage.put(UnitType::MiniBlock, &hash, buff)?;
        }

        {
            let txs = self.txs_for_block.lock();
            for mini_block in tx_mini_blocks(body) {
                for hash in &mini_block.tx_hashes {
                    let tx = txs
                        .get(hash)
                        .ok_or_else(|| BlockError::MissingTransaction(hex::encode(hash)))?;
                    let buff = self.marshalizer.marshal(tx)?;
                    self.storage.put(UnitType::Transaction, hash, buff)?;
                }
            }
        }

        self.scr_preprocessor.save_tx_block_to_storage(body)?;
        if let Err(err) = self.intermediate.save_current_intermediate_tx_to_storage() {
            warn!("[sn-05] Saving intermediate results failed: {}", err);
        }

        self.remove_block_from_pools(body)?;

        let root_hash = self.accounts.commit()?;
        chain.set_current(header.clone(), header_hash.clone(), body.clone());

        if let Err(err) =
            self.fork_detector
                .add_header(header, &header_hash, HeaderState::Processed, &[], &[])
        {
            debug!(
                "[sn-05] Fork detector rejected header nonce {}: {}",
                header.nonce(),
                err
            );
        }

        self.requests_with_timeout.lock().remove(&header_hash);
        info!(
            "[sn-05] Committed block nonce {} hash {} root {}",
            header.nonce(),
            hex::encode(&header_hash),
            hex::encode(&root_hash)
        );
        Ok(())
    }

    fn remove_block_from_pools(&self, body: &Body) -> BlockResult<()> {
        for mini_block in tx_mini_blocks(body) {
            let cache_id =
                shard_cacher_identifier(mini_block.sender_shard_id, mini_block.receiver_shard_id);
            self.tx_pool
                .remove_set_of_data_from_pool(&mini_block.tx_hashes, &cache_id);

            let hash = calculate_hash(&self.marshalizer, self.hasher.as_ref(), mini_block)?;
            self.mini_block_pool.remove(&hash);
        }

        self.scr_preprocessor
            .remove_tx_block_from_pools(body, &self.mini_block_pool)?;
        Ok(())
    }
}

fn tx_mini_blocks(body: &Body) -> impl Iterator<Item = &MiniBlock> {
    body.mini_blocks
        .iter()
        .filter(|mini_block| mini_block.block_type == BlockType::TxBlock)
}
