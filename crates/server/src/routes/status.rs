// crates/server/src/routes/status.rs
//! Readiness probe for external automation tools.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Response for the status endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct StatusResponse {
    pub success: bool,
    pub status: String,
    pub window_ready: bool,
}

/// GET /api/status - Application readiness.
///
/// `windowReady` reflects whether a UI is attached to receive inject
/// payloads; tools poll it before POSTing code.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        success: true,
        status: "running".to_string(),
        window_ready: state.ui.is_ready(),
    })
}

/// Create the status routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(get_status))
}
