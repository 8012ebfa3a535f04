//! # Inbound Ports
//!
//! Intermediate result aggregation API.

use std::collections::BTreeMap;

use shared_types::{AnyTransaction, Body, Hash, MiniBlock, ShardId};

use crate::domain::IntermediateResult;

/// Collects results produced while executing a block and packages them
/// into per-destination mini-blocks.
///
/// `create_block_started` must run before the first
/// `add_intermediate_transactions` of a new block.
pub trait IntermediateTransactionHandler: Send + Sync {
    /// File results produced by contract execution.
    ///
    /// Only smart contract results are accepted; any other payload fails with
    /// `WrongTypeAssertion`.
    fn add_intermediate_transactions(&self, txs: &[AnyTransaction]) -> IntermediateResult<()>;

    /// Mini-blocks for every destination shard other than self.
    fn create_all_inter_mini_blocks(&self) -> BTreeMap<ShardId, MiniBlock>;

    /// Check that result mini-blocks in `body` match the locally created ones.
    fn verify_inter_mini_blocks(&self, body: &Body) -> IntermediateResult<()>;

    /// Persist every filed result. Storage failures are logged only.
    fn save_current_intermediate_tx_to_storage(&self) -> IntermediateResult<()>;

    /// Forget the results of the previous block.
    fn create_block_started(&self);

    /// Marshal filed results for broadcasting, in the given hash order.
    fn create_marshalized_data(&self, tx_hashes: &[Hash]) -> IntermediateResult<Vec<Vec<u8>>>;
}
