//! Event bus for broadcasting feed events to façade subscribers.

use super::{EventEmitter, FeedEvent};
use tokio::sync::broadcast;
use tracing::debug;

/// Default broadcast channel capacity
const DEFAULT_CAPACITY: usize = 1024;

/// Distributes [`FeedEvent`]s via `tokio::sync::broadcast`.
///
/// Fire-and-forget: emitting never blocks, never panics. With no
/// subscribers connected, events are silently dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<FeedEvent>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventEmitter for EventBus {
    fn emit(&self, event: FeedEvent) {
        let action = format!("{:?}", event.action);
        match self.sender.send(event) {
            Ok(n) => {
                debug!(action = %action, subscribers = n, "feed event emitted");
            }
            Err(_) => {
                // No subscribers — expected and fine
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
