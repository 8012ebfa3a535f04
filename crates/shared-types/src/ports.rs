//! # Shared Ports
//!
//! Traits implemented by one component and consumed by several others.

use crate::entities::{Hash, ShardId};

/// Outbound requests for data missing from the local pools.
///
/// Requests are fire-and-forget: answers arrive later through the pools,
/// whose add handlers wake up any waiter.
pub trait RequestHandler: Send + Sync {
    /// Ask peers of `shard_id` for user transactions.
    fn request_transactions(&self, shard_id: ShardId, hashes: &[Hash]);

    /// Ask peers of `shard_id` for smart contract results.
    fn request_unsigned_transactions(&self, shard_id: ShardId, hashes: &[Hash]);

    /// Ask for a mini-block by hash.
    fn request_mini_block(&self, shard_id: ShardId, hash: &[u8]);

    /// Ask for a header by hash.
    fn request_header(&self, shard_id: ShardId, hash: &[u8]);

    /// Ask for a header by nonce.
    fn request_header_by_nonce(&self, shard_id: ShardId, nonce: u64);
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// One recorded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedRequest {
    /// `request_transactions`
    Transactions(ShardId, Vec<Hash>),
    /// `request_unsigned_transactions`
    UnsignedTransactions(ShardId, Vec<Hash>),
    /// `request_mini_block`
    MiniBlock(ShardId, Hash),
    /// `request_header`
    Header(ShardId, Hash),
    /// `request_header_by_nonce`
    HeaderByNonce(ShardId, u64),
}

/// Request handler that only records what was asked.
#[derive(Default)]
pub struct MockRequestHandler {
    requests: parking_lot::Mutex<Vec<RecordedRequest>>,
}

impl MockRequestHandler {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests recorded so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    fn record(&self, request: RecordedRequest) {
        self.requests.lock().push(request);
    }
}

impl RequestHandler for MockRequestHandler {
    fn request_transactions(&self, shard_id: ShardId, hashes: &[Hash]) {
        self.record(RecordedRequest::Transactions(shard_id, hashes.to_vec()));
    }

    fn request_unsigned_transactions(&self, shard_id: ShardId, hashes: &[Hash]) {
        self.record(RecordedRequest::UnsignedTransactions(shard_id, hashes.to_vec()));
    }

    fn request_mini_block(&self, shard_id: ShardId, hash: &[u8]) {
        self.record(RecordedRequest::MiniBlock(shard_id, hash.to_vec()));
    }

    fn request_header(&self, shard_id: ShardId, hash: &[u8]) {
        self.record(RecordedRequest::Header(shard_id, hash.to_vec()));
    }

    fn request_header_by_nonce(&self, shard_id: ShardId, nonce: u64) {
        self.record(RecordedRequest::HeaderByNonce(shard_id, nonce));
    }
}
