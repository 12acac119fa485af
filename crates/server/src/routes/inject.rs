// crates/server/src/routes/inject.rs
//! Code injection endpoints for external automation tools.
//!
//! Both endpoints only forward an [`InjectEvent`] to the UI channel —
//! the render itself is started by whatever is attached there. Bodies
//! are taken as raw bytes and parsed as one JSON document so that any
//! parse failure, malformed JSON or non-UTF-8 alike, is a plain 400
//! matching the wire contract tools rely on.

use std::path::PathBuf;
use std::sync::Arc;

use animatic_types::InjectEvent;
use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Body of POST /api/inject-code.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectCodeRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default = "default_auto_render")]
    pub auto_render: bool,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

/// Body of POST /api/inject-file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectFileRequest {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default = "default_auto_render")]
    pub auto_render: bool,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

fn default_auto_render() -> bool {
    true
}

/// Success body of the inject endpoints.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct InjectResponse {
    pub success: bool,
    pub message: String,
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|_| ApiError::InvalidJson)
}

/// POST /api/inject-code - Forward a code payload to the attached UI.
pub async fn inject_code(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<InjectResponse>> {
    let req: InjectCodeRequest = parse_body(&body)?;
    let code = req
        .code
        .filter(|code| !code.is_empty())
        .ok_or(ApiError::MissingCode)?;

    state
        .ui
        .send(InjectEvent {
            code,
            auto_render: req.auto_render,
            output_path: req.output_path,
        })
        .map_err(|_| ApiError::WindowNotReady)?;

    tracing::info!(auto_render = req.auto_render, "code injected");
    Ok(Json(InjectResponse {
        success: true,
        message: if req.auto_render {
            "Code injected and render started".to_string()
        } else {
            "Code injected successfully".to_string()
        },
    }))
}

/// POST /api/inject-file - Read a file and forward its contents.
///
/// The read is async so a slow disk cannot stall event delivery for
/// in-flight jobs sharing the runtime.
pub async fn inject_file(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<InjectResponse>> {
    let req: InjectFileRequest = parse_body(&body)?;
    let file_path = req
        .file_path
        .filter(|path| !path.is_empty())
        .ok_or(ApiError::MissingFilePath)?;

    let code = tokio::fs::read_to_string(&file_path)
        .await
        .map_err(|_| ApiError::UnreadableFile(file_path.clone()))?;

    state
        .ui
        .send(InjectEvent {
            code,
            auto_render: req.auto_render,
            output_path: req.output_path,
        })
        .map_err(|_| ApiError::WindowNotReady)?;

    tracing::info!(%file_path, auto_render = req.auto_render, "file injected");
    Ok(Json(InjectResponse {
        success: true,
        message: if req.auto_render {
            "File loaded and render started".to_string()
        } else {
            "File loaded successfully".to_string()
        },
    }))
}

/// Build the inject router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/inject-code", post(inject_code))
        .route("/inject-file", post(inject_file))
}
