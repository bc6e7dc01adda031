//! Notification adapters.

use crate::error::AnchorResult;
use crate::ports::outbound::NotificationPort;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_bus::{AnchorEvent, EventPublisher, InMemoryEventBus};
use std::sync::Arc;

/// Publishes anchoring events onto the in-process bus.
pub struct BusNotifier {
    bus: Arc<InMemoryEventBus>,
}

impl BusNotifier {
    pub fn new(bus: Arc<InMemoryEventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl NotificationPort for BusNotifier {
    async fn notify(&self, event: AnchorEvent) -> AnchorResult<()> {
        // Zero subscribers is fine; events are advisory.
        self.bus.publish(event).await;
        Ok(())
    }
}

/// Captures events for assertions in tests.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<AnchorEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AnchorEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl NotificationPort for RecordingNotifier {
    async fn notify(&self, event: AnchorEvent) -> AnchorResult<()> {
        self.events.lock().push(event);
        Ok(())
    }
}
