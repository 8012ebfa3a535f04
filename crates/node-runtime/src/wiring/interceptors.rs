//! # Data Interceptors
//!
//! Processors for the data topics a shard node listens on. They decode
//! what peers broadcast, or send back in answer to a request, and drop it
//! into the data pools, where the block processor and the result
//! preprocessor pick it up.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{
    calculate_hash, shard_cacher_identifier, Address, BincodeMarshalizer, DataPools, Hasher,
    HashCache, Header, HeaderState, Marshalizer, MiniBlock, ShardedDataPool, SmartContractResult,
    Transaction,
};
use sn_02_sharding::{AddressConverter, ShardCoordinator};
use sn_06_fork_detection::ForkDetector;
use sn_07_resolvers::domain::topics::{
    header_topic, shard_topic, MINI_BLOCKS_TOPIC, TRANSACTIONS_TOPIC, UNSIGNED_TRANSACTIONS_TOPIC,
};
use sn_07_resolvers::{Message, MessageProcessor, Messenger, ResolverError, ResolverResult};
use tracing::debug;

/// Items addressed from one account to another.
pub trait Routed: Serialize {
    /// Sender address bytes.
    fn sender(&self) -> &[u8];
    /// Receiver address bytes.
    fn receiver(&self) -> &[u8];
    /// Hash of the transaction that produced the item, if it has one.
    fn origin_tx_hash(&self) -> Option<&[u8]> {
        None
    }
}

impl Routed for Transaction {
    fn sender(&self) -> &[u8] {
        &self.sender
    }

    fn receiver(&self) -> &[u8] {
        &self.receiver
    }
}

impl Routed for SmartContractResult {
    fn sender(&self) -> &[u8] {
        &self.sender
    }

    fn receiver(&self) -> &[u8] {
        &self.receiver
    }

    fn origin_tx_hash(&self) -> Option<&[u8]> {
        Some(&self.tx_hash)
    }
}

/// Reject items with missing fields and convert both addresses.
fn check_routed<V: Routed>(
    item: &V,
    converter: &dyn AddressConverter,
) -> ResolverResult<(Address, Address)> {
    if item.sender().is_empty() {
        return Err(ResolverError::NilSenderAddress);
    }
    if item.receiver().is_empty() {
        return Err(ResolverError::NilReceiverAddress);
    }
    if item.origin_tx_hash().is_some_and(|hash| hash.is_empty()) {
        return Err(ResolverError::NilTxHash);
    }

    let sender = converter
        .create_address(item.sender())
        .map_err(ResolverError::InvalidSenderAddress)?;
    let receiver = converter
        .create_address(item.receiver())
        .map_err(ResolverError::InvalidReceiverAddress)?;
    Ok((sender, receiver))
}

fn unpack<M: Marshalizer>(marshalizer: &M, data: &[u8]) -> ResolverResult<Vec<Vec<u8>>> {
    Ok(marshalizer.unmarshal(data)?)
}

/// Stores packed transactions or results in a sharded pool, under the
/// cache of their sender and receiver shards.
///
/// Items are keyed by their canonical hash so block processing finds them
/// whatever padding the peer sent.
pub struct TxInterceptor<V, M: Marshalizer = BincodeMarshalizer> {
    marshalizer: M,
    hasher: Arc<dyn Hasher>,
    pool: Arc<ShardedDataPool<V>>,
    shard_coordinator: Arc<dyn ShardCoordinator>,
    address_converter: Arc<dyn AddressConverter>,
}

impl<V, M> TxInterceptor<V, M>
where
    V: Routed + DeserializeOwned + Clone + Send + Sync,
    M: Marshalizer,
{
    /// Create an interceptor feeding `pool`.
    pub fn new(
        marshalizer: M,
        hasher: Arc<dyn Hasher>,
        pool: Arc<ShardedDataPool<V>>,
        shard_coordinator: Arc<dyn ShardCoordinator>,
        address_converter: Arc<dyn AddressConverter>,
    ) -> Self {
        Self {
            marshalizer,
            hasher,
            pool,
            shard_coordinator,
            address_converter,
        }
    }

    fn intercept(&self, buff: &[u8]) -> ResolverResult<()> {
        let item: V = self.marshalizer.unmarshal(buff)?;
        let (sender, receiver) = check_routed(&item, self.address_converter.as_ref())?;
        let cache_id = shard_cacher_identifier(
            self.shard_coordinator.compute_id(&sender),
            self.shard_coordinator.compute_id(&receiver),
        );

        let hash = calculate_hash(&self.marshalizer, self.hasher.as_ref(), &item)?;
        self.pool.add_data(&hash, item, &cache_id)?;
        Ok(())
    }
}

impl<V, M> MessageProcessor for TxInterceptor<V, M>
where
    V: Routed + DeserializeOwned + Clone + Send + Sync,
    M: Marshalizer,
{
    /// Pools every valid item of the batch and reports the first rejection.
    fn process_received_message(&self, message: &Message) -> ResolverResult<()> {
        let buffers = unpack(&self.marshalizer, &message.data)?;
        let mut first_err = None;
        let mut accepted = 0;

        for buff in &buffers {
            match self.intercept(buff) {
                Ok(()) => accepted += 1,
                Err(err) => {
                    debug!("[sn-07] Dropped item on {} from {}: {}", message.topic, message.peer, err);
                    first_err.get_or_insert(err);
                }
            }
        }
        debug!(
            "[sn-07] Intercepted {}/{} items on {} from {}",
            accepted,
            buffers.len(),
            message.topic,
            message.peer
        );
        first_err.map_or(Ok(()), Err)
    }
}

/// Stores packed mini-blocks in the mini-block pool.
pub struct MiniBlockInterceptor<M: Marshalizer = BincodeMarshalizer> {
    marshalizer: M,
    hasher: Arc<dyn Hasher>,
    pool: Arc<HashCache<MiniBlock>>,
}

impl<M: Marshalizer> MiniBlockInterceptor<M> {
    /// Create an interceptor feeding `pool`.
    pub fn new(marshalizer: M, hasher: Arc<dyn Hasher>, pool: Arc<HashCache<MiniBlock>>) -> Self {
        Self {
            marshalizer,
            hasher,
            pool,
        }
    }
}

impl<M: Marshalizer> MessageProcessor for MiniBlockInterceptor<M> {
    fn process_received_message(&self, message: &Message) -> ResolverResult<()> {
        for buff in unpack(&self.marshalizer, &message.data)? {
            let mini_block: MiniBlock = self.marshalizer.unmarshal(&buff)?;
            let hash = calculate_hash(&self.marshalizer, self.hasher.as_ref(), &mini_block)?;
            self.pool.put(&hash, mini_block)?;
        }
        Ok(())
    }
}

/// Stores a header in the header pools and reports headers of the node's
/// own shard to the fork detector.
pub struct HeaderInterceptor<M: Marshalizer = BincodeMarshalizer> {
    marshalizer: M,
    hasher: Arc<dyn Hasher>,
    pools: DataPools,
    fork_detector: Arc<dyn ForkDetector>,
    shard_coordinator: Arc<dyn ShardCoordinator>,
}

impl<M: Marshalizer> HeaderInterceptor<M> {
    /// Create an interceptor.
    pub fn new(
        marshalizer: M,
        hasher: Arc<dyn Hasher>,
        pools: DataPools,
        fork_detector: Arc<dyn ForkDetector>,
        shard_coordinator: Arc<dyn ShardCoordinator>,
    ) -> Self {
        Self {
            marshalizer,
            hasher,
            pools,
            fork_detector,
            shard_coordinator,
        }
    }
}

impl<M: Marshalizer> MessageProcessor for HeaderInterceptor<M> {
    fn process_received_message(&self, message: &Message) -> ResolverResult<()> {
        let header: Header = self.marshalizer.unmarshal(&message.data)?;
        let hash = calculate_hash(&self.marshalizer, self.hasher.as_ref(), &header)?;

        let pool = if header.is_meta() {
            &self.pools.meta_blocks
        } else {
            &self.pools.headers
        };
        pool.put(&hash, header.clone())?;
        self.pools
            .header_nonces
            .put(header.shard_id(), header.nonce(), hash.clone());

        if header.shard_id() == self.shard_coordinator.self_id() {
            if let Err(err) =
                self.fork_detector
                    .add_header(&header, &hash, HeaderState::Received, &[], &[])
            {
                debug!(
                    "[sn-07] Fork detector rejected header nonce {} from {}: {}",
                    header.nonce(),
                    message.peer,
                    err
                );
            }
        }
        Ok(())
    }
}

/// Collaborators needed to wire the interceptors.
pub struct InterceptorWiring<M: Marshalizer = BincodeMarshalizer> {
    /// Network endpoint.
    pub messenger: Arc<dyn Messenger>,
    /// Shard layout.
    pub shard_coordinator: Arc<dyn ShardCoordinator>,
    /// Validates intercepted addresses.
    pub address_converter: Arc<dyn AddressConverter>,
    /// Pools fed by the interceptors.
    pub pools: DataPools,
    /// Hasher for item keys.
    pub hasher: Arc<dyn Hasher>,
    /// Canonical codec.
    pub marshalizer: M,
    /// Receives the node's own shard headers.
    pub fork_detector: Arc<dyn ForkDetector>,
}

impl<M: Marshalizer + Clone> InterceptorWiring<M> {
    /// Join every data topic of a shard node and attach its interceptor.
    /// Returns the joined topics.
    pub fn register(&self) -> ResolverResult<Vec<String>> {
        let coordinator = self.shard_coordinator.as_ref();
        let mut topics = Vec::new();

        for shard_id in 0..coordinator.number_of_shards() {
            let topic = shard_topic(coordinator, TRANSACTIONS_TOPIC, shard_id);
            self.attach(
                &topic,
                Arc::new(TxInterceptor::new(
                    self.marshalizer.clone(),
                    Arc::clone(&self.hasher),
                    Arc::clone(&self.pools.transactions),
                    Arc::clone(&self.shard_coordinator),
                    Arc::clone(&self.address_converter),
                )),
            )?;
            topics.push(topic);

            let topic = shard_topic(coordinator, UNSIGNED_TRANSACTIONS_TOPIC, shard_id);
            self.attach(
                &topic,
                Arc::new(TxInterceptor::new(
                    self.marshalizer.clone(),
                    Arc::clone(&self.hasher),
                    Arc::clone(&self.pools.unsigned_transactions),
                    Arc::clone(&self.shard_coordinator),
                    Arc::clone(&self.address_converter),
                )),
            )?;
            topics.push(topic);

            let topic = shard_topic(coordinator, MINI_BLOCKS_TOPIC, shard_id);
            self.attach(
                &topic,
                Arc::new(MiniBlockInterceptor::new(
                    self.marshalizer.clone(),
                    Arc::clone(&self.hasher),
                    Arc::clone(&self.pools.mini_blocks),
                )),
            )?;
            topics.push(topic);
        }

        for shard_id in [coordinator.self_id(), shared_types::METACHAIN_SHARD_ID] {
            let topic = header_topic(coordinator, shard_id);
            self.attach(
                &topic,
                Arc::new(HeaderInterceptor::new(
                    self.marshalizer.clone(),
                    Arc::clone(&self.hasher),
                    self.pools.clone(),
                    Arc::clone(&self.fork_detector),
                    Arc::clone(&self.shard_coordinator),
                )),
            )?;
            topics.push(topic);
        }

        Ok(topics)
    }

    fn attach(&self, topic: &str, processor: Arc<dyn MessageProcessor>) -> ResolverResult<()> {
        self.messenger.create_topic(topic, true)?;
        self.messenger.register_message_processor(topic, processor)
    }
}
