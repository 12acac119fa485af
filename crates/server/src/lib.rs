// crates/server/src/lib.rs
//! Animatic control-plane server library.
//!
//! This crate provides the axum-based loopback HTTP server that lets
//! external tools drive renders without the desktop UI: code/file
//! injection and readiness probing. Render orchestration itself lives
//! in `animatic-render`; this crate only wires it to the network and
//! to whatever UI is attached.

pub mod error;
pub mod routes;
pub mod runner;
pub mod state;
pub mod ui;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::api_routes;
pub use runner::{spawn_event_logger, spawn_headless_runner};
pub use state::AppState;
pub use ui::UiChannel;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the axum application with all routes and middleware.
///
/// This sets up:
/// - API routes (inject-code, inject-file, status)
/// - CORS open to any origin (the listener is loopback-only; local
///   tools and browser extensions are the expected callers)
/// - Request tracing
/// - A JSON 404 for everything unmatched
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found")))
}

// ============================================================================
// Integration Tests
// ============================================================================
