//! # In-Memory Network
//!
//! A process-local stand-in for the p2p transport. Every `MemoryMessenger`
//! joins a shared `MemoryNetwork`; messages are handed straight to the
//! receiving peer's topic processor.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::domain::{ResolverError, ResolverResult};
use crate::ports::{Message, MessageProcessor, Messenger, PeerId};

/// Registry of connected in-memory peers.
#[derive(Default)]
pub struct MemoryNetwork {
    peers: RwLock<HashMap<PeerId, Weak<MemoryMessenger>>>,
}

impl MemoryNetwork {
    /// Create an empty network.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn peer(&self, id: &str) -> Option<Arc<MemoryMessenger>> {
        self.peers.read().get(id).and_then(Weak::upgrade)
    }

    fn others(&self, id: &str) -> Vec<Arc<MemoryMessenger>> {
        self.peers
            .read()
            .iter()
            .filter(|(peer_id, _)| peer_id.as_str() != id)
            .filter_map(|(_, peer)| peer.upgrade())
            .collect()
    }
}

/// One peer on a `MemoryNetwork`.
pub struct MemoryMessenger {
    id: PeerId,
    network: Arc<MemoryNetwork>,
    topics: RwLock<HashMap<String, Option<Arc<dyn MessageProcessor>>>>,
}

impl MemoryMessenger {
    /// Join `network` as `id`.
    pub fn new(id: impl Into<PeerId>, network: &Arc<MemoryNetwork>) -> Arc<Self> {
        let messenger = Arc::new(Self {
            id: id.into(),
            network: Arc::clone(network),
            topics: RwLock::new(HashMap::new()),
        });
        network
            .peers
            .write()
            .insert(messenger.id.clone(), Arc::downgrade(&messenger));
        messenger
    }

    /// Topics this peer joined.
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.topics.read().keys().cloned().collect();
        topics.sort();
        topics
    }

    fn deliver(&self, topic: &str, data: Vec<u8>, from: &str) -> ResolverResult<()> {
        let processor = self
            .topics
            .read()
            .get(topic)
            .ok_or_else(|| ResolverError::PeerNotOnTopic {
                peer: self.id.clone(),
                topic: topic.to_string(),
            })?
            .clone();

        match processor {
            Some(processor) => processor.process_received_message(&Message {
                topic: topic.to_string(),
                data,
                peer: from.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Messenger for MemoryMessenger {
    fn id(&self) -> PeerId {
        self.id.clone()
    }

    async fn broadcast(&self, topic: &str, data: Vec<u8>) {
        for peer in self.network.others(&self.id) {
            if !peer.has_topic(topic) {
                continue;
            }
            if let Err(err) = peer.deliver(topic, data.clone(), &self.id) {
                debug!("[sn-07] Peer {} rejected message on {}: {}", peer.id, topic, err);
            }
        }
    }

    fn create_topic(&self, name: &str, _buffered: bool) -> ResolverResult<()> {
        let mut topics = self.topics.write();
        if topics.contains_key(name) {
            return Err(ResolverError::TopicAlreadyExists(name.to_string()));
        }
        topics.insert(name.to_string(), None);
        Ok(())
    }

    fn has_topic(&self, name: &str) -> bool {
        self.topics.read().contains_key(name)
    }

    fn register_message_processor(
        &self,
        topic: &str,
        processor: Arc<dyn MessageProcessor>,
    ) -> ResolverResult<()> {
        let mut topics = self.topics.write();
        let slot = topics
            .get_mut(topic)
            .ok_or_else(|| ResolverError::TopicNotFound(topic.to_string()))?;
        if slot.is_some() {
            return Err(ResolverError::ProcessorAlreadyRegistered(topic.to_string()));
        }
        *slot = Some(processor);
        Ok(())
    }

    fn connected_peers_on_topic(&self, topic: &str) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = self
            .network
            .others(&self.id)
            .into_iter()
            .filter(|peer| peer.has_topic(topic))
            .map(|peer| peer.id.clone())
            .collect();
        peers.sort();
        peers
    }

    fn send_to_connected_peer(&self, topic: &str, data: Vec<u8>, peer: &str) -> ResolverResult<()> {
        let target = self
            .network
            .peer(peer)
            .ok_or_else(|| ResolverError::PeerNotFound(peer.to_string()))?;
        target.deliver(topic, data, &self.id)
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

/// Processor that records every message it receives.
#[derive(Default)]
pub struct RecordingProcessor {
    messages: RwLock<Vec<Message>>,
}

impl RecordingProcessor {
    /// Create an empty recorder.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Messages received so far.
    pub fn messages(&self) -> Vec<Message> {
        self.messages.read().clone()
    }
}

impl MessageProcessor for RecordingProcessor {
    fn process_received_message(&self, message: &Message) -> ResolverResult<()> {
        self.messages.write().push(message.clone());
        Ok(())
    }
}
