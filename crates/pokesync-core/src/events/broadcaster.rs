//! Event broadcaster for store events.
//!
//! The `EventBroadcaster` is the bus that evented stores publish to and that
//! the controller and garbage collector subscribe to. It uses tokio's
//! broadcast channel, so slow receivers observe `Lagged` rather than
//! blocking publishers.

use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::StoreEvent;

/// Default buffer size for the broadcast channel.
/// Events beyond this limit will cause older events to be dropped for slow receivers.
const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Broadcaster for store events.
///
/// Cloning shares the underlying channel.
///
/// ```
/// use pokesync_core::{EventBroadcaster, ObjectKey, StoreEvent, StoreEventType};
///
/// let broadcaster = EventBroadcaster::new();
/// let mut receiver = broadcaster.subscribe();
/// broadcaster.send(StoreEvent::spec(
///     StoreEventType::Created,
///     ObjectKey::new("default", "pika"),
///     "uid-1",
/// ));
/// assert!(receiver.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBroadcaster {
    /// Create a new broadcaster with default buffer size.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    /// Create a new broadcaster with custom buffer size.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new broadcaster wrapped in an Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Send an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, 0 if there are none.
    pub fn send(&self, event: StoreEvent) -> usize {
        self.sender.send(event).unwrap_or_default()
    }

    /// Subscribe to events.
    ///
    /// Events sent before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Check if there are any active subscribers.
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
