// crates/server/src/routes/mod.rs
//! API route handlers for the animatic control plane.

pub mod inject;
pub mod status;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - POST /api/inject-code - Forward code to the attached UI
/// - POST /api/inject-file - Forward a file's contents to the attached UI
/// - GET  /api/status - Application and window readiness
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", status::router())
        .nest("/api", inject::router())
        .with_state(state)
}
