//! # Resolver Request Handler
//!
//! Implements the block processor's `RequestHandler` on top of the
//! resolvers container: each request picks the resolver of the matching
//! topic and asks a peer. Requests are fire-and-forget; failures are
//! logged and the caller keeps waiting on its pools.

use std::ops::Range;
use std::sync::Arc;

use shared_types::{Hash, RequestHandler, ShardId, MAX_HEADER_REQUESTS_ALLOWED};
use sn_02_sharding::ShardCoordinator;
use tracing::{debug, warn};

use crate::domain::topics::{
    header_topic, shard_topic, MINI_BLOCKS_TOPIC, TRANSACTIONS_TOPIC, UNSIGNED_TRANSACTIONS_TOPIC,
};
use crate::domain::ResolverResult;
use crate::ports::Resolver;
use crate::service::ResolversContainer;

/// `RequestHandler` backed by resolvers.
pub struct ResolverRequestHandler {
    container: Arc<ResolversContainer>,
    shard_coordinator: Arc<dyn ShardCoordinator>,
}

impl ResolverRequestHandler {
    /// Create a handler over `container`.
    pub fn new(container: Arc<ResolversContainer>, shard_coordinator: Arc<dyn ShardCoordinator>) -> Self {
        Self {
            container,
            shard_coordinator,
        }
    }

    /// Ask for the headers of `shard_id` in a nonce range, at most
    /// `MAX_HEADER_REQUESTS_ALLOWED` of them. Returns the number asked.
    pub fn request_headers_by_nonce_range(&self, shard_id: ShardId, nonces: Range<u64>) -> usize {
        let mut requested = 0;
        for nonce in nonces.take(MAX_HEADER_REQUESTS_ALLOWED) {
            self.request_header_by_nonce(shard_id, nonce);
            requested += 1;
        }
        requested
    }

    fn with_resolver<F>(&self, topic: &str, request: F)
    where
        F: FnOnce(&dyn Resolver) -> ResolverResult<()>,
    {
        let result = self
            .container
            .get(topic)
            .and_then(|resolver| request(resolver.as_ref()));

        if let Err(err) = result {
            warn!("[sn-07] Request on {} failed: {}", topic, err);
        }
    }

    fn data_topic(&self, base: &str, shard_id: ShardId) -> String {
        shard_topic(self.shard_coordinator.as_ref(), base, shard_id)
    }
}

impl RequestHandler for ResolverRequestHandler {
    fn request_transactions(&self, shard_id: ShardId, hashes: &[Hash]) {
        if hashes.is_empty() {
            return;
        }
        debug!(
            "[sn-07] Requesting {} transactions from shard {}",
            hashes.len(),
            shard_id
        );
        let topic = self.data_topic(TRANSACTIONS_TOPIC, shard_id);
        self.with_resolver(&topic, |resolver| {
            resolver.request_data_from_hash_array(hashes)
        });
    }

    fn request_unsigned_transactions(&self, shard_id: ShardId, hashes: &[Hash]) {
        if hashes.is_empty() {
            return;
        }
        debug!(
            "[sn-07] Requesting {} results from shard {}",
            hashes.len(),
            shard_id
        );
        let topic = self.data_topic(UNSIGNED_TRANSACTIONS_TOPIC, shard_id);
        self.with_resolver(&topic, |resolver| {
            resolver.request_data_from_hash_array(hashes)
        });
    }

    fn request_mini_block(&self, shard_id: ShardId, hash: &[u8]) {
        let topic = self.data_topic(MINI_BLOCKS_TOPIC, shard_id);
        self.with_resolver(&topic, |resolver| resolver.request_data_from_hash(hash));
    }

    fn request_header(&self, shard_id: ShardId, hash: &[u8]) {
        let topic = header_topic(self.shard_coordinator.as_ref(), shard_id);
        self.with_resolver(&topic, |resolver| resolver.request_data_from_hash(hash));
    }

    fn request_header_by_nonce(&self, shard_id: ShardId, nonce: u64) {
        let topic = header_topic(self.shard_coordinator.as_ref(), shard_id);
        self.with_resolver(&topic, |resolver| resolver.request_data_from_nonce(nonce));
    }
}
