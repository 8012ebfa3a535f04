//! Driving port used by the block processor.

use shared_types::{Hash, Header, HeaderState};

use crate::domain::{ForkCheck, ForkResult};

/// Fork detector contract.
pub trait ForkDetector: Send + Sync {
    /// Register a header. When `state` is `Processed`, `final_headers` are
    /// the headers this one made final and are registered as notarized.
    fn add_header(
        &self,
        header: &Header,
        hash: &[u8],
        state: HeaderState,
        final_headers: &[Header],
        final_hashes: &[Hash],
    ) -> ForkResult<()>;

    /// Drop the entry with `hash` at `nonce`, and any checkpoint at `nonce`.
    fn remove_headers(&self, nonce: u64, hash: &[u8]);

    /// Lowest nonce at which a competing header should replace the local one.
    fn check_fork(&self) -> ForkCheck;

    /// Nonce of the final checkpoint.
    fn get_highest_final_block_nonce(&self) -> u64;

    /// Highest nonce seen among non-proposed headers.
    fn probable_highest_nonce(&self) -> u64;

    /// Fall back to the checkpoint nonce after a quiet period.
    fn reset_probable_highest_nonce_if_needed(&self);
}
