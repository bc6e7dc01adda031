//! # Shared Bus
//!
//! In-process broadcast bus for anchoring events.
//!
//! The engine publishes every lifecycle step here through its
//! notification port; the runtime's event log, operator tooling, and
//! tests subscribe. Delivery is best-effort fan-out: a publish with no
//! subscribers succeeds, and a subscriber that falls behind loses the
//! oldest events rather than stalling the pipeline.
//!
//! ```rust,ignore
//! let bus = InMemoryEventBus::new();
//! let mut sub = bus.subscribe(EventFilter::all()).await;
//! bus.publish(AnchorEvent::BatchFormed { .. }).await;
//! let event = sub.recv().await;
//! ```

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{AnchorEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Default broadcast channel capacity. Sized for hours of anchoring
/// cadence; overflow only drops events for subscribers already lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
