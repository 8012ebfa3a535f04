//! Resolver contract.

use shared_types::Hash;

use crate::domain::{ResolverError, ResolverResult};
use crate::ports::MessageProcessor;

/// A resolver answers requests on its request topic and asks peers for
/// data of its kind.
pub trait Resolver: MessageProcessor {
    /// Ask a peer for the item with `hash`.
    fn request_data_from_hash(&self, hash: &[u8]) -> ResolverResult<()>;

    /// Ask a peer for several items at once.
    fn request_data_from_hash_array(&self, _hashes: &[Hash]) -> ResolverResult<()> {
        Err(ResolverError::ResolveTypeUnknown)
    }

    /// Ask a peer for the header at `nonce`.
    fn request_data_from_nonce(&self, _nonce: u64) -> ResolverResult<()> {
        Err(ResolverError::ResolveTypeUnknown)
    }
}
