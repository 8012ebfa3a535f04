//! # Cross-Shard Packaging
//!
//! Groups filed results by destination shard. Hashes inside each group are
//! sorted ascending, so the output depends only on the set of inputs.

use std::collections::BTreeMap;

use shared_types::{BlockType, Hash, MiniBlock, ShardId};

/// Build one mini-block per destination shard other than `self_id`.
///
/// Groups that end up empty are omitted.
pub fn build_cross_shard_mini_blocks<'a, I>(
    self_id: ShardId,
    block_type: BlockType,
    entries: I,
) -> BTreeMap<ShardId, MiniBlock>
where
    I: IntoIterator<Item = (&'a Hash, ShardId)>,
{
    let mut mini_blocks: BTreeMap<ShardId, MiniBlock> = BTreeMap::new();

    for (hash, receiver_shard_id) in entries {
        if receiver_shard_id == self_id {
            continue;
        }
        mini_blocks
            .entry(receiver_shard_id)
            .or_insert_with(|| MiniBlock {
                tx_hashes: Vec::new(),
                receiver_shard_id,
                sender_shard_id: self_id,
                block_type,
            })
            .tx_hashes
            .push(hash.clone());
    }

    for mini_block in mini_blocks.values_mut() {
        mini_block.tx_hashes.sort();
    }
    mini_blocks
}
