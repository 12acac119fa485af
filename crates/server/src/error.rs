// crates/server/src/error.rs
//! Control-plane API errors.
//!
//! Every fault crossing the network boundary becomes a structured
//! `{ "success": false, "error": "..." }` body with the right status
//! code; nothing escapes as a framework-shaped rejection.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Structured JSON error body for API failures.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// API error types that map to HTTP status codes.
///
/// The display strings are the wire contract; external tools match on
/// them, so they stay exactly as the desktop app has always sent them.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing code parameter")]
    MissingCode,

    #[error("Missing filePath parameter")]
    MissingFilePath,

    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Cannot read file: {0}")]
    UnreadableFile(String),

    #[error("Application window not ready")]
    WindowNotReady,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingCode
            | ApiError::MissingFilePath
            | ApiError::InvalidJson
            | ApiError::UnreadableFile(_) => StatusCode::BAD_REQUEST,
            ApiError::WindowNotReady => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::WindowNotReady => {
                tracing::warn!("inject request arrived with no UI attached")
            }
            other => tracing::warn!(error = %other, "rejected control-plane request"),
        }
        (self.status(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn extract(response: Response) -> (StatusCode, ErrorResponse) {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_missing_code_is_400() {
        let (status, body) = extract(ApiError::MissingCode.into_response()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
        assert_eq!(body.error, "Missing code parameter");
    }

    #[tokio::test]
    async fn test_invalid_json_is_400() {
        let (status, body) = extract(ApiError::InvalidJson.into_response()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Invalid JSON");
    }

    #[tokio::test]
    async fn test_unreadable_file_carries_path() {
        let err = ApiError::UnreadableFile("/tmp/missing.tsx".to_string());
        let (status, body) = extract(err.into_response()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Cannot read file: /tmp/missing.tsx");
    }

    #[tokio::test]
    async fn test_window_not_ready_is_500() {
        let (status, body) = extract(ApiError::WindowNotReady.into_response()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Application window not ready");
    }

    #[test]
    fn test_error_response_shape() {
        let json = serde_json::to_string(&ErrorResponse::new("Not found")).unwrap();
        assert_eq!(json, "{\"success\":false,\"error\":\"Not found\"}");
    }
}
