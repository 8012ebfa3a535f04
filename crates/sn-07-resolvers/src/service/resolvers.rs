//! # Resolvers
//!
//! Each resolver listens on a request topic. A request names items by hash
//! (or a header by nonce); the resolver looks in its pool first, then in
//! storage, and answers the asking peer on the data topic. Transaction and
//! mini-block answers are packed lists of marshaled items; header answers
//! are one marshaled header.

use std::sync::Arc;

use serde::Serialize;
use shared_types::{
    BincodeMarshalizer, Hash, HashCache, Header, Marshalizer, MiniBlock, NonceHashCache,
    ShardedDataPool, StorageService, UnitType, MAX_BULK_TRANSACTION_SIZE,
};
use tracing::debug;

use crate::algorithms::SizeDataPacker;
use crate::domain::{RequestData, RequestDataType, ResolverError, ResolverResult};
use crate::ports::{Message, MessageProcessor, Resolver};
use crate::service::TopicResolverSender;

/// Marshal the found items in chunks and send every chunk to `peer`.
fn send_packed<M: Marshalizer + Clone>(
    sender: &TopicResolverSender<M>,
    items: &[Vec<u8>],
    peer: &str,
) -> ResolverResult<()> {
    let packer = SizeDataPacker::new(sender.marshalizer().clone());
    for chunk in packer.pack_data_in_chunks(items, MAX_BULK_TRANSACTION_SIZE)? {
        sender.send(chunk, peer)?;
    }
    Ok(())
}

/// Resolve each requested hash, skipping the ones not found.
fn collect_found<F>(hashes: &[Hash], fetch: F) -> Vec<Vec<u8>>
where
    F: Fn(&[u8]) -> ResolverResult<Vec<u8>>,
{
    hashes
        .iter()
        .filter_map(|hash| match fetch(hash) {
            Ok(buff) => Some(buff),
            Err(err) => {
                debug!("[sn-07] Cannot resolve {}: {}", hex::encode(hash), err);
                None
            }
        })
        .collect()
}

/// Serves transactions or smart contract results from a sharded pool.
pub struct TxResolver<V, M: Marshalizer = BincodeMarshalizer> {
    sender: TopicResolverSender<M>,
    pool: Arc<ShardedDataPool<V>>,
    storage: Arc<dyn StorageService>,
    unit: UnitType,
}

impl<V, M> TxResolver<V, M>
where
    V: Clone + Serialize + Send + Sync,
    M: Marshalizer + Clone,
{
    /// Create a resolver reading stored items from `unit`.
    pub fn new(
        sender: TopicResolverSender<M>,
        pool: Arc<ShardedDataPool<V>>,
        storage: Arc<dyn StorageService>,
        unit: UnitType,
    ) -> Self {
        Self {
            sender,
            pool,
            storage,
            unit,
        }
    }

    fn fetch(&self, hash: &[u8]) -> ResolverResult<Vec<u8>> {
        if let Some(item) = self.pool.search_first_data(hash) {
            return Ok(self.sender.marshalizer().marshal(&item)?);
        }
        Ok(self.storage.get(self.unit, hash)?)
    }
}

impl<V, M> MessageProcessor for TxResolver<V, M>
where
    V: Clone + Serialize + Send + Sync,
    M: Marshalizer + Clone,
{
    fn process_received_message(&self, message: &Message) -> ResolverResult<()> {
        let request: RequestData = self.sender.marshalizer().unmarshal(&message.data)?;
        let items = match request.kind {
            RequestDataType::Hash => vec![self
                .fetch(&request.value)
                .map_err(|_| ResolverError::RequestedItemNotFound(hex::encode(&request.value)))?],
            RequestDataType::HashArray => {
                let hashes: Vec<Hash> = self.sender.marshalizer().unmarshal(&request.value)?;
                collect_found(&hashes, |hash| self.fetch(hash))
            }
            RequestDataType::Nonce => return Err(ResolverError::ResolveTypeUnknown),
        };

        if items.is_empty() {
            return Ok(());
        }
        send_packed(&self.sender, &items, &message.peer)
    }
}

impl<V, M> Resolver for TxResolver<V, M>
where
    V: Clone + Serialize + Send + Sync,
    M: Marshalizer + Clone,
{
    fn request_data_from_hash(&self, hash: &[u8]) -> ResolverResult<()> {
        self.sender.send_on_request_topic(&RequestData::hash(hash))
    }

    fn request_data_from_hash_array(&self, hashes: &[Hash]) -> ResolverResult<()> {
        let buff = self.sender.marshalizer().marshal(hashes)?;
        self.sender.send_on_request_topic(&RequestData::hash_array(buff))
    }
}

/// Serves mini-blocks from the mini-block pool.
pub struct MiniBlockResolver<M: Marshalizer = BincodeMarshalizer> {
    sender: TopicResolverSender<M>,
    pool: Arc<HashCache<MiniBlock>>,
    storage: Arc<dyn StorageService>,
}

impl<M: Marshalizer + Clone> MiniBlockResolver<M> {
    /// Create a resolver.
    pub fn new(
        sender: TopicResolverSender<M>,
        pool: Arc<HashCache<MiniBlock>>,
        storage: Arc<dyn StorageService>,
    ) -> Self {
        Self {
            sender,
            pool,
            storage,
        }
    }

    fn fetch(&self, hash: &[u8]) -> ResolverResult<Vec<u8>> {
        if let Some(mini_block) = self.pool.get(hash) {
            return Ok(self.sender.marshalizer().marshal(&mini_block)?);
        }
        Ok(self.storage.get(UnitType::MiniBlock, hash)?)
    }
}

impl<M: Marshalizer + Clone> MessageProcessor for MiniBlockResolver<M> {
    fn process_received_message(&self, message: &Message) -> ResolverResult<()> {
        let request: RequestData = self.sender.marshalizer().unmarshal(&message.data)?;
        let hashes = match request.kind {
            RequestDataType::Hash => vec![request.value],
            RequestDataType::HashArray => self.sender.marshalizer().unmarshal(&request.value)?,
            RequestDataType::Nonce => return Err(ResolverError::ResolveTypeUnknown),
        };

        let items = collect_found(&hashes, |hash| self.fetch(hash));
        if items.is_empty() {
            return Ok(());
        }
        send_packed(&self.sender, &items, &message.peer)
    }
}

impl<M: Marshalizer + Clone> Resolver for MiniBlockResolver<M> {
    fn request_data_from_hash(&self, hash: &[u8]) -> ResolverResult<()> {
        self.sender.send_on_request_topic(&RequestData::hash(hash))
    }

    fn request_data_from_hash_array(&self, hashes: &[Hash]) -> ResolverResult<()> {
        let buff = self.sender.marshalizer().marshal(hashes)?;
        self.sender.send_on_request_topic(&RequestData::hash_array(buff))
    }
}

/// Serves shard or metachain headers by hash or nonce.
pub struct HeaderResolver<M: Marshalizer = BincodeMarshalizer> {
    sender: TopicResolverSender<M>,
    headers: Arc<HashCache<Header>>,
    nonces: Arc<NonceHashCache>,
    storage: Arc<dyn StorageService>,
    header_unit: UnitType,
    nonce_unit: UnitType,
}

impl<M: Marshalizer> HeaderResolver<M> {
    /// Create a resolver. Stored headers are read from `header_unit`, the
    /// nonce index from `nonce_unit`.
    pub fn new(
        sender: TopicResolverSender<M>,
        headers: Arc<HashCache<Header>>,
        nonces: Arc<NonceHashCache>,
        storage: Arc<dyn StorageService>,
        header_unit: UnitType,
        nonce_unit: UnitType,
    ) -> Self {
        Self {
            sender,
            headers,
            nonces,
            storage,
            header_unit,
            nonce_unit,
        }
    }

    fn resolve_hash(&self, hash: &[u8]) -> ResolverResult<Vec<u8>> {
        if let Some(header) = self.headers.get(hash) {
            return Ok(self.sender.marshalizer().marshal(&header)?);
        }
        self.storage
            .get(self.header_unit, hash)
            .map_err(|_| ResolverError::RequestedItemNotFound(hex::encode(hash)))
    }

    fn resolve_nonce(&self, request: &RequestData) -> ResolverResult<Vec<u8>> {
        let nonce = request
            .nonce_value()
            .ok_or(ResolverError::InvalidNonceByteSlice)?;

        let hash = match self.nonces.get(self.sender.target_shard_id(), nonce) {
            Some(hash) => hash,
            None => self
                .storage
                .get(self.nonce_unit, &request.value)
                .map_err(|_| ResolverError::RequestedItemNotFound(format!("nonce {}", nonce)))?,
        };
        self.resolve_hash(&hash)
    }
}

impl<M: Marshalizer> MessageProcessor for HeaderResolver<M> {
    fn process_received_message(&self, message: &Message) -> ResolverResult<()> {
        let request: RequestData = self.sender.marshalizer().unmarshal(&message.data)?;
        let buff = match request.kind {
            RequestDataType::Hash => self.resolve_hash(&request.value)?,
            RequestDataType::Nonce => self.resolve_nonce(&request)?,
            RequestDataType::HashArray => return Err(ResolverError::ResolveTypeUnknown),
        };
        self.sender.send(buff, &message.peer)
    }
}

impl<M: Marshalizer> Resolver for HeaderResolver<M> {
    fn request_data_from_hash(&self, hash: &[u8]) -> ResolverResult<()> {
        self.sender.send_on_request_topic(&RequestData::hash(hash))
    }

    fn request_data_from_nonce(&self, nonce: u64) -> ResolverResult<()> {
        self.sender.send_on_request_topic(&RequestData::nonce(nonce))
    }
}
