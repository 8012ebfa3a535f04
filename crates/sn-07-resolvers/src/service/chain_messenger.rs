//! # Shard Chain Messenger
//!
//! Publishes what a shard node produces: its blocks to its own shard, its
//! headers to the metachain, and cross-shard mini-blocks and transactions
//! to their destination shards. Messages go through the broadcast queue,
//! so every call returns without waiting on the network.
//!
//! Mini-blocks travel as packed lists of marshaled mini-blocks, the same
//! form resolvers answer with, so a topic carries one wire format.

use std::collections::BTreeMap;
use std::sync::Arc;

use shared_types::{
    BincodeMarshalizer, Body, Header, Marshalizer, ShardId, MAX_BULK_TRANSACTION_SIZE,
    METACHAIN_SHARD_ID,
};
use sn_02_sharding::ShardCoordinator;
use tracing::info;

use crate::algorithms::SizeDataPacker;
use crate::domain::topics::{
    shard_topic, HEADERS_TOPIC, MINI_BLOCKS_TOPIC, SHARD_HEADERS_FOR_METACHAIN_TOPIC,
};
use crate::domain::ResolverResult;
use crate::service::BroadcastQueue;

/// Broadcaster for a shard node.
pub struct ShardChainMessenger<M: Marshalizer = BincodeMarshalizer> {
    marshalizer: M,
    packer: SizeDataPacker<M>,
    queue: BroadcastQueue,
    shard_coordinator: Arc<dyn ShardCoordinator>,
}

impl<M: Marshalizer + Clone> ShardChainMessenger<M> {
    /// Create a broadcaster writing into `queue`.
    pub fn new(marshalizer: M, queue: BroadcastQueue, shard_coordinator: Arc<dyn ShardCoordinator>) -> Self {
        Self {
            packer: SizeDataPacker::new(marshalizer.clone()),
            marshalizer,
            queue,
            shard_coordinator,
        }
    }

    /// Send the header and the mini-blocks of a block to the node's own
    /// shard.
    pub fn broadcast_block(&self, body: &Body, header: &Header) -> ResolverResult<()> {
        body.integrity_and_validity()?;

        let header_buff = self.marshalizer.marshal(header)?;
        let mini_blocks = body
            .mini_blocks
            .iter()
            .map(|mini_block| self.marshalizer.marshal(mini_block))
            .collect::<Result<Vec<_>, _>>()?;
        let self_id = self.shard_coordinator.self_id();

        self.queue
            .enqueue(self.topic(HEADERS_TOPIC, self_id), header_buff);
        self.enqueue_packed(&self.topic(MINI_BLOCKS_TOPIC, self_id), &mini_blocks)?;
        Ok(())
    }

    /// Send a header to the metachain.
    pub fn broadcast_header(&self, header: &Header) -> ResolverResult<()> {
        let buff = self.marshalizer.marshal(header)?;
        self.queue.enqueue(
            self.topic(SHARD_HEADERS_FOR_METACHAIN_TOPIC, METACHAIN_SHARD_ID),
            buff,
        );
        Ok(())
    }

    /// Send marshaled mini-blocks to their destination shards.
    pub fn broadcast_mini_blocks(&self, mini_blocks: &BTreeMap<ShardId, Vec<Vec<u8>>>) -> ResolverResult<()> {
        let mut sent = 0;
        for (shard_id, buffers) in mini_blocks {
            sent += buffers.len();
            self.enqueue_packed(&self.topic(MINI_BLOCKS_TOPIC, *shard_id), buffers)?;
        }
        if sent > 0 {
            info!("[sn-07] Sent {} mini-blocks to {} shards", sent, mini_blocks.len());
        }
        Ok(())
    }

    /// Send marshaled items per topic, packed in chunks.
    pub fn broadcast_transactions(&self, transactions: &BTreeMap<String, Vec<Vec<u8>>>) -> ResolverResult<()> {
        let mut sent = 0;
        for (topic, items) in transactions {
            sent += items.len();
            self.enqueue_packed(topic, items)?;
        }
        if sent > 0 {
            info!("[sn-07] Sent {} transactions", sent);
        }
        Ok(())
    }

    fn enqueue_packed(&self, topic: &str, items: &[Vec<u8>]) -> ResolverResult<()> {
        for chunk in self.packer.pack_data_in_chunks(items, MAX_BULK_TRANSACTION_SIZE)? {
            self.queue.enqueue(topic.to_string(), chunk);
        }
        Ok(())
    }

    fn topic(&self, base: &str, dest: ShardId) -> String {
        shard_topic(self.shard_coordinator.as_ref(), base, dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{BroadcastConfig, OutboundMessage};
    use shared_types::{MiniBlock, ShardHeader};
    use sn_02_sharding::MockShardCoordinator;
    use tokio::sync::mpsc::Receiver;

    fn messenger() -> (ShardChainMessenger, Receiver<OutboundMessage>) {
        let (queue, receiver) = BroadcastQueue::new(&BroadcastConfig::default());
        let messenger = ShardChainMessenger::new(
            BincodeMarshalizer,
            queue,
            Arc::new(MockShardCoordinator::new(3, 1)),
        );
        (messenger, receiver)
    }

    fn drain(receiver: &mut Receiver<OutboundMessage>) -> Vec<OutboundMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = receiver.try_recv() {
            messages.push(message);
        }
        messages
    }

    fn topics(messages: &[OutboundMessage]) -> Vec<&str> {
        messages.iter().map(|message| message.topic.as_str()).collect()
    }

    #[test]
    fn test_broadcast_block() {
        let (messenger, mut receiver) = messenger();
        let header: Header = ShardHeader::default().into();
        let mini_block = MiniBlock {
            tx_hashes: vec![vec![7]],
            sender_shard_id: 1,
            receiver_shard_id: 1,
            ..Default::default()
        };

        messenger
            .broadcast_block(&Body::new(vec![mini_block.clone()]), &header)
            .unwrap();
        let messages = drain(&mut receiver);
        assert_eq!(topics(&messages), vec!["headers_1", "miniBlocks_1"]);

        let packed: Vec<Vec<u8>> = BincodeMarshalizer.unmarshal(&messages[1].data).unwrap();
        let sent: MiniBlock = BincodeMarshalizer.unmarshal(&packed[0]).unwrap();
        assert_eq!(sent, mini_block);

        let broken = Body::new(vec![MiniBlock::default()]);
        assert!(messenger.broadcast_block(&broken, &header).is_err());
        assert!(drain(&mut receiver).is_empty());
    }

    #[test]
    fn test_broadcast_header_goes_to_metachain() {
        let (messenger, mut receiver) = messenger();
        messenger
            .broadcast_header(&ShardHeader::default().into())
            .unwrap();
        assert_eq!(
            topics(&drain(&mut receiver)),
            vec!["shardHeadersForMetachain_1_META"]
        );
    }

    #[test]
    fn test_broadcast_mini_blocks_and_transactions() {
        let (messenger, mut receiver) = messenger();

        let mini_blocks = BTreeMap::from([(0, vec![vec![1]]), (2, vec![vec![2]]), (1, Vec::new())]);
        messenger.broadcast_mini_blocks(&mini_blocks).unwrap();
        assert_eq!(
            topics(&drain(&mut receiver)),
            vec!["miniBlocks_0_1", "miniBlocks_1_2"]
        );

        let transactions = BTreeMap::from([("transactions_0_1".to_string(), vec![vec![1u8; 8]; 3])]);
        messenger.broadcast_transactions(&transactions).unwrap();
        assert_eq!(topics(&drain(&mut receiver)), vec!["transactions_0_1"]);
    }
}
