//! Best-effort broadcast of trade and snapshot events.

use tokio::sync::broadcast;
use tracing::trace;

use super::EngineEvent;

/// Publishes [`EngineEvent`]s to any number of subscribers.
///
/// Publication only ever happens after the originating WAL record(s) are
/// durable. Delivery is best-effort: a `send` with no active subscribers is
/// not an error and never propagates back into the engine's hot path.
pub struct EventEmitter {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventEmitter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Never blocks the caller and never fails the
    /// engine: an absent subscriber just means the event is dropped.
    pub fn publish(&self, event: EngineEvent) {
        if self.sender.send(event).is_err() {
            trace!("no active subscribers for event, dropping");
        }
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(1024)
    }
}
