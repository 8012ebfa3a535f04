//! # Topic Resolver Sender
//!
//! Sends requests on a topic's request channel to a random peer, and
//! answers back on the topic itself.

use std::sync::Arc;

use rand::seq::SliceRandom;
use shared_types::{BincodeMarshalizer, Marshalizer, ShardId};

use crate::domain::topics::request_topic;
use crate::domain::{RequestData, ResolverError, ResolverResult};
use crate::ports::{Messenger, PeerId};

/// Peers of a main topic that are not on an excluded topic.
///
/// Used to ask peers of another shard rather than the node's own shard
/// mates, which share its pools.
pub struct DiffPeerListCreator {
    messenger: Arc<dyn Messenger>,
    main_topic: String,
    excluded_topic: String,
}

impl DiffPeerListCreator {
    /// Create a list creator. An empty `excluded_topic` excludes nobody.
    pub fn new(messenger: Arc<dyn Messenger>, main_topic: &str, excluded_topic: &str) -> Self {
        Self {
            messenger,
            main_topic: main_topic.to_string(),
            excluded_topic: excluded_topic.to_string(),
        }
    }

    /// Candidate peers. Falls back to every peer of the main topic when the
    /// exclusion leaves nobody.
    pub fn peer_list(&self) -> Vec<PeerId> {
        let all = self.messenger.connected_peers_on_topic(&self.main_topic);
        if self.excluded_topic.is_empty() {
            return all;
        }

        let excluded = self.messenger.connected_peers_on_topic(&self.excluded_topic);
        let diff: Vec<PeerId> = all
            .iter()
            .filter(|peer| !excluded.contains(peer))
            .cloned()
            .collect();
        if diff.is_empty() {
            return all;
        }
        diff
    }
}

/// Request/response sender bound to one topic.
pub struct TopicResolverSender<M: Marshalizer = BincodeMarshalizer> {
    messenger: Arc<dyn Messenger>,
    topic: String,
    peer_list_creator: DiffPeerListCreator,
    marshalizer: M,
    target_shard_id: ShardId,
}

impl<M: Marshalizer> TopicResolverSender<M> {
    /// Create a sender for `topic`, serving data of `target_shard_id`.
    pub fn new(
        messenger: Arc<dyn Messenger>,
        topic: &str,
        peer_list_creator: DiffPeerListCreator,
        marshalizer: M,
        target_shard_id: ShardId,
    ) -> Self {
        Self {
            messenger,
            topic: topic.to_string(),
            peer_list_creator,
            marshalizer,
            target_shard_id,
        }
    }

    /// Send a request to one random candidate peer.
    pub fn send_on_request_topic(&self, request: &RequestData) -> ResolverResult<()> {
        let buff = self.marshalizer.marshal(request)?;
        let peers = self.peer_list_creator.peer_list();
        let peer = peers
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| ResolverError::NoConnectedPeerToSendRequest(self.topic.clone()))?;

        self.messenger
            .send_to_connected_peer(&request_topic(&self.topic), buff, peer)
    }

    /// Answer `peer` on the data topic.
    pub fn send(&self, data: Vec<u8>, peer: &str) -> ResolverResult<()> {
        self.messenger.send_to_connected_peer(&self.topic, data, peer)
    }

    /// The data topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Shard whose data this sender requests.
    pub fn target_shard_id(&self) -> ShardId {
        self.target_shard_id
    }

    pub(crate) fn marshalizer(&self) -> &M {
        &self.marshalizer
    }
}
