//! Unified error types for the service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Generic message returned to clients for unexpected failures.
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong!";

/// Startup and process-level errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Metrics exporter could not be installed.
    #[error("metrics exporter error: {0}")]
    Metrics(String),

    /// IO error (bind, accept).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Request-level errors, each rendered as a JSON body.
#[derive(Error, Debug)]
pub enum AppError {
    /// Client input failed validation.
    #[error("{0}")]
    BadRequest(String),

    /// Request body could not be parsed.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// No route matched the request.
    #[error("no route for {path}")]
    NotFound {
        /// Requested path, without query string.
        path: String,
    },

    /// Unexpected failure while handling the request.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::BadRequest(message) => json!({ "error": message }),
            AppError::MalformedBody(message) => json!({
                "error": "malformed request body",
                "message": message,
            }),
            AppError::NotFound { path } => json!({ "error": "Not Found", "path": path }),
            AppError::Internal(message) => {
                tracing::error!(error = %message, "request failed");
                json!({ "error": INTERNAL_ERROR_MESSAGE, "message": message })
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Convenient Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_error_kind() {
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MalformedBody("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::NotFound { path: "/x".into() }.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn into_response_keeps_status() {
        let response = AppError::NotFound { path: "/missing".into() }.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
