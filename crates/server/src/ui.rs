// crates/server/src/ui.rs
//! Channel between the control plane and the attached UI.
//!
//! The control plane never renders anything itself: injected code is
//! forwarded on this channel, and whatever is attached — the desktop
//! window or the headless runner — decides what to do with it. The
//! readiness flag is what `GET /api/status` reports as `windowReady`.

use std::sync::atomic::{AtomicBool, Ordering};

use animatic_types::InjectEvent;
use thiserror::Error;
use tokio::sync::broadcast;

/// No UI is attached to receive the inject payload.
#[derive(Debug, Error)]
#[error("no UI attached")]
pub struct UiDetached;

/// Broadcast channel of inject payloads plus an attach-state flag.
pub struct UiChannel {
    tx: broadcast::Sender<InjectEvent>,
    ready: AtomicBool,
}

impl UiChannel {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            tx,
            ready: AtomicBool::new(false),
        }
    }

    /// Attach a UI: marks the window ready and returns the receiving
    /// end. Multiple consumers may attach; readiness flips on the first.
    pub fn attach(&self) -> broadcast::Receiver<InjectEvent> {
        self.ready.store(true, Ordering::SeqCst);
        self.tx.subscribe()
    }

    /// Mark the window gone (last window closed).
    pub fn detach(&self) {
        self.ready.store(false, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Forward an inject payload to the attached UI.
    pub fn send(&self, event: InjectEvent) -> Result<(), UiDetached> {
        if !self.is_ready() {
            return Err(UiDetached);
        }
        if self.tx.send(event).is_err() {
            // The receiver was dropped without a detach call.
            self.ready.store(false, Ordering::SeqCst);
            return Err(UiDetached);
        }
        Ok(())
    }
}

impl Default for UiChannel {
    fn default() -> Self {
        Self::new()
    }
}
