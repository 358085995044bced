//! Error types and handling for the chat relay.
//!
//! This module provides a unified error type [`AppError`] that wraps the
//! failure modes of the relay and converts them into HTTP responses. Only
//! errors raised before a stream starts go through here; once `/chat` has
//! committed its headers, failures travel in-band as SSE error frames.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Detail message returned when the `Authorization` header is missing.
pub const AUTH_REQUIRED_DETAIL: &str = "Authorization header required";

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum AppError {
    /// Network-level failure reaching the upstream (DNS, refused, timeout)
    #[error("Request error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Inbound request carried no authorization header
    #[error("{}", AUTH_REQUIRED_DETAIL)]
    Unauthorized,

    /// Inbound body failed the required-shape checks
    #[error("Validation error: {0}")]
    Validation(String),

    /// Upstream answered with a non-success status
    #[error("Upstream API error: {body}")]
    Upstream { status: u16, body: String },

    /// Generic internal server errors with custom message
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Transport(_)
            | AppError::Serialization(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::Unauthorized | AppError::Validation(_) => {
                tracing::debug!(status = status.as_u16(), error = %self, "Rejected request");
            }
            AppError::Upstream { status: upstream, .. } => {
                tracing::warn!(upstream_status = upstream, "Upstream returned an error");
            }
            _ => {
                tracing::error!(status = status.as_u16(), error = %self, "Request failed");
            }
        }

        let detail = match self {
            AppError::Validation(msg) => msg,
            AppError::Internal(msg) => msg,
            other => other.to_string(),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Convenience type alias for Results using [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
