//! # Broadcast Queue
//!
//! Outbound messages are queued and sent by a separate worker, so block
//! processing never waits on the network. When the queue is full the
//! message is dropped and a warning logged.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::ports::Messenger;

/// Outbound queue sizing.
#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    /// Messages buffered before new ones are dropped.
    pub queue_capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
        }
    }
}

/// One message waiting to be broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Destination topic.
    pub topic: String,
    /// Payload.
    pub data: Vec<u8>,
}

/// Producer side of the outbound queue.
#[derive(Clone)]
pub struct BroadcastQueue {
    sender: mpsc::Sender<OutboundMessage>,
}

impl BroadcastQueue {
    /// Create a queue and the receiver its worker drains.
    pub fn new(config: &BroadcastConfig) -> (Self, mpsc::Receiver<OutboundMessage>) {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Queue a message without waiting. Returns false if it was dropped.
    pub fn enqueue(&self, topic: String, data: Vec<u8>) -> bool {
        match self.sender.try_send(OutboundMessage { topic, data }) {
            Ok(()) => true,
            Err(TrySendError::Full(message)) => {
                warn!(
                    "[sn-07] Broadcast queue full, dropping message on {}",
                    message.topic
                );
                false
            }
            Err(TrySendError::Closed(message)) => {
                warn!(
                    "[sn-07] Broadcast worker stopped, dropping message on {}",
                    message.topic
                );
                false
            }
        }
    }
}

/// Drain the queue into the messenger until every producer is gone.
pub async fn run_broadcast_worker(
    mut receiver: mpsc::Receiver<OutboundMessage>,
    messenger: Arc<dyn Messenger>,
) {
    let mut sent = 0u64;
    while let Some(message) = receiver.recv().await {
        debug!(
            "[sn-07] Broadcasting {} bytes on {}",
            message.data.len(),
            message.topic
        );
        messenger.broadcast(&message.topic, message.data).await;
        sent += 1;
    }
    info!("[sn-07] Broadcast worker stopped after {} messages", sent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryMessenger, MemoryNetwork, RecordingProcessor};
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_full_queue_drops() {
        let (queue, mut receiver) = BroadcastQueue::new(&BroadcastConfig { queue_capacity: 2 });

        assert!(queue.enqueue("t".into(), vec![1]));
        assert!(queue.enqueue("t".into(), vec![2]));
        assert!(!queue.enqueue("t".into(), vec![3]));

        assert_eq!(receiver.try_recv().unwrap().data, vec![1]);
        assert_eq!(receiver.try_recv().unwrap().data, vec![2]);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_closed_queue_drops() {
        let (queue, receiver) = BroadcastQueue::new(&BroadcastConfig::default());
        drop(receiver);
        assert!(!queue.enqueue("t".into(), vec![1]));
    }

    #[tokio::test]
    async fn test_worker_delivers_in_order() {
        let network = MemoryNetwork::new();
        let sender = MemoryMessenger::new("sender", &network);
        let listener = MemoryMessenger::new("listener", &network);
        let recorder = RecordingProcessor::new();
        listener.create_topic("t", false).unwrap();
        listener.register_message_processor("t", recorder.clone()).unwrap();

        let (queue, receiver) = BroadcastQueue::new(&BroadcastConfig::default());
        let worker = tokio::spawn(run_broadcast_worker(receiver, sender));

        for i in 0..5u8 {
            assert!(queue.enqueue("t".into(), vec![i]));
        }
        drop(queue);
        worker.await.unwrap();

        let data: Vec<Vec<u8>> = recorder.messages().into_iter().map(|m| m.data).collect();
        assert_eq!(data, (0..5u8).map(|i| vec![i]).collect::<Vec<_>>());
    }

    #[test]
    fn test_worker_idles_until_queue_closes() {
        let network = MemoryNetwork::new();
        let sender = MemoryMessenger::new("sender", &network);
        let listener = MemoryMessenger::new("listener", &network);
        let recorder = RecordingProcessor::new();
        listener.create_topic("t", false).unwrap();
        listener.register_message_processor("t", recorder.clone()).unwrap();

        let (queue, receiver) = BroadcastQueue::new(&BroadcastConfig::default());
        let mut worker = task::spawn(run_broadcast_worker(receiver, sender));

        assert_pending!(worker.poll());
        assert!(queue.enqueue("t".into(), vec![7]));
        assert!(worker.is_woken());
        assert_pending!(worker.poll());
        assert_eq!(recorder.messages().len(), 1);

        drop(queue);
        assert_ready!(worker.poll());
    }
}
