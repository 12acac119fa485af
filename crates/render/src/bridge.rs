// crates/render/src/bridge.rs
//! Broadcast fan-out of render lifecycle events.
//!
//! The bridge supports any number of simultaneous sinks (the desktop
//! UI, a diagnostics logger, tests) without publishers knowing about
//! them. Dropping a receiver unsubscribes it. Per-publisher order is
//! preserved for every subscriber by the broadcast channel.

use animatic_types::RenderEvent;
use tokio::sync::broadcast;

/// Cloneable handle to the event fan-out channel.
#[derive(Clone)]
pub struct EventBridge {
    tx: broadcast::Sender<RenderEvent>,
}

impl EventBridge {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all current subscribers. Lossy when nobody
    /// is listening, which is fine: events carry no obligations beyond
    /// notification.
    pub fn publish(&self, event: RenderEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("render event dropped, no subscribers");
        }
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RenderEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBridge {
    fn default() -> Self {
        Self::new(256)
    }
}
