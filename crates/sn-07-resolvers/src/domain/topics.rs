//! # Topic Names
//!
//! Pub/sub topics carry a shard-pair suffix produced by the shard
//! coordinator (`transactions_0_1`, `headers_2`). Requests for a topic's
//! data travel on the same name with [`REQUEST_SUFFIX`] appended.

use shared_types::{ShardId, METACHAIN_SHARD_ID};
use sn_02_sharding::ShardCoordinator;

/// User transactions.
pub const TRANSACTIONS_TOPIC: &str = "transactions";

/// Smart contract results.
pub const UNSIGNED_TRANSACTIONS_TOPIC: &str = "unsignedTransactions";

/// Mini-blocks and block bodies.
pub const MINI_BLOCKS_TOPIC: &str = "miniBlocks";

/// Shard headers inside one shard.
pub const HEADERS_TOPIC: &str = "headers";

/// Shard headers sent to the metachain.
pub const SHARD_HEADERS_FOR_METACHAIN_TOPIC: &str = "shardHeadersForMetachain";

/// Metachain headers.
pub const METACHAIN_BLOCKS_TOPIC: &str = "metachainBlocks";

/// Appended to a topic to form its request topic.
pub const REQUEST_SUFFIX: &str = "_REQUEST";

/// `base` suffixed with the identifier between this shard and `dest`.
pub fn shard_topic(coordinator: &dyn ShardCoordinator, base: &str, dest: ShardId) -> String {
    format!("{}{}", base, coordinator.communication_identifier(dest))
}

/// Request topic for `topic`.
pub fn request_topic(topic: &str) -> String {
    format!("{}{}", topic, REQUEST_SUFFIX)
}

/// Topic on which headers of `shard_id` are exchanged, seen from this node.
///
/// Metachain headers use one global topic. A metachain node receives shard
/// headers on the shard-to-metachain topics; a shard node on its own
/// header topic.
pub fn header_topic(coordinator: &dyn ShardCoordinator, shard_id: ShardId) -> String {
    if shard_id == METACHAIN_SHARD_ID {
        return METACHAIN_BLOCKS_TOPIC.to_string();
    }
    if coordinator.self_id() == METACHAIN_SHARD_ID {
        return shard_topic(coordinator, SHARD_HEADERS_FOR_METACHAIN_TOPIC, shard_id);
    }
    shard_topic(coordinator, HEADERS_TOPIC, coordinator.self_id())
}
