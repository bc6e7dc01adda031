//! Subscription side of the event bus.

use crate::events::{AnchorEvent, EventFilter};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;

/// Errors from non-blocking receives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("event bus closed")]
    Closed,
}

/// A handle for receiving filtered events.
///
/// A slow subscriber that falls more than the channel capacity behind
/// loses the oldest events; the loss is counted in
/// [`Subscription::lagged`] and logged, never surfaced as an error,
/// because anchoring events are advisory.
pub struct Subscription {
    receiver: broadcast::Receiver<AnchorEvent>,
    filter: EventFilter,
    lagged: u64,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<AnchorEvent>, filter: EventFilter) -> Self {
        Self {
            receiver,
            filter,
            lagged: 0,
        }
    }

    /// Next event matching the filter, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<AnchorEvent> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    self.lagged += count;
                    warn!(count, "[bus] subscriber lagged, events skipped");
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Some(event);
            }
        }
    }

    /// Non-blocking receive: `Ok(None)` when nothing is queued.
    pub fn try_recv(&mut self) -> Result<Option<AnchorEvent>, SubscriptionError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    self.lagged += count;
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    /// Events lost to channel overflow so far.
    #[must_use]
    pub fn lagged(&self) -> u64 {
        self.lagged
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}
