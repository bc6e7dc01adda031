//! Publishing side of the event bus.

use crate::events::{AnchorEvent, EventFilter};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, error};

/// Interface the engine's notification adapter publishes through.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event. Returns the number of subscribers that
    /// received it; zero is not an error, events are advisory.
    async fn publish(&self, event: AnchorEvent) -> usize;

    /// Total events published since creation. Doubles as a sequence
    /// number: the nth publish carries sequence n.
    fn events_published(&self) -> u64;
}

/// In-process event bus over a tokio broadcast channel.
///
/// Suitable for a single-node deployment; a distributed deployment
/// would put a durable queue behind the same trait.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<AnchorEvent>,
    events_published: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to events matching `filter`. The subscription sees
    /// only events published after this call.
    pub async fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        debug!(topics = ?filter.topics, "[bus] subscription created");
        Subscription::new(receiver, filter)
    }

    /// Number of currently attached subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: AnchorEvent) -> usize {
        let sequence = self.events_published.fetch_add(1, Ordering::Relaxed);

        // Alerts reach the log even with nobody subscribed.
        if let AnchorEvent::OperatorAlert { batch_id, message } = &event {
            error!(?batch_id, "[bus] operator alert: {message}");
        }

        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(sequence, receivers, "[bus] event published");
                receivers
            }
            Err(e) => {
                debug!(sequence, "[bus] event dropped, no receivers: {}", e.0.kind());
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
