//! Topic pub/sub transport used by resolvers and the broadcast worker.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ResolverResult;

/// Transport-level peer identity.
pub type PeerId = String;

/// A message received on a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Topic the message arrived on.
    pub topic: String,
    /// Payload.
    pub data: Vec<u8>,
    /// Sender.
    pub peer: PeerId,
}

/// Handler for messages on one topic.
pub trait MessageProcessor: Send + Sync {
    /// Handle an incoming message.
    fn process_received_message(&self, message: &Message) -> ResolverResult<()>;
}

/// Topic messenger contract.
///
/// Broadcasts fan out to every peer on the topic and may suspend; direct
/// sends are handed to the transport and return at once.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// This node's peer id.
    fn id(&self) -> PeerId;

    /// Publish `data` to every peer on `topic`.
    async fn broadcast(&self, topic: &str, data: Vec<u8>);

    /// Join a topic. `buffered` asks the transport for a receive queue.
    fn create_topic(&self, name: &str, buffered: bool) -> ResolverResult<()>;

    /// Returns true if this node joined the topic.
    fn has_topic(&self, name: &str) -> bool;

    /// Attach the handler for a joined topic.
    fn register_message_processor(
        &self,
        topic: &str,
        processor: Arc<dyn MessageProcessor>,
    ) -> ResolverResult<()>;

    /// Peers, other than this one, that joined `topic`.
    fn connected_peers_on_topic(&self, topic: &str) -> Vec<PeerId>;

    /// Send `data` on `topic` to one peer.
    fn send_to_connected_peer(&self, topic: &str, data: Vec<u8>, peer: &str) -> ResolverResult<()>;
}
