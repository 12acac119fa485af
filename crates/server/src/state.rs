// crates/server/src/state.rs
//! Application state for the control-plane server.

use std::sync::Arc;

use animatic_render::RenderManager;

use crate::ui::UiChannel;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Render orchestration: registry, supervisor, event bridge.
    pub manager: Arc<RenderManager>,
    /// Channel to the attached UI (or headless runner).
    pub ui: Arc<UiChannel>,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(manager: Arc<RenderManager>) -> Arc<Self> {
        Arc::new(Self {
            manager,
            ui: Arc::new(UiChannel::new()),
        })
    }
}
