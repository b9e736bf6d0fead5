//! Error types for the letter backend
//!
//! Provides unified error handling using thiserror.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// Message returned to clients when the rate limiter rejects a validation attempt.
pub const RATE_LIMITED_MESSAGE: &str = "Too many validation attempts, please try again later";

// == App Error Enum ==
/// Unified error type for the letter backend.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed request data
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Client exceeded the validation rate limit
    #[error("Rate limited")]
    RateLimited,

    /// Tracked record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Underlying storage call failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Required configuration absent at startup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Persistence(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to hand back to the caller.
    ///
    /// Server-side failures collapse to a generic message; the detail is
    /// only logged.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::RateLimited => RATE_LIMITED_MESSAGE.to_string(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Persistence(_) => "Failed to access storage".to_string(),
            AppError::Configuration(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "success": false,
            "message": self.public_message()
        }));

        (status, body).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Persistence(format!("corrupt document: {}", err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(detail = %rejection.body_text(), "Rejected request body");
        let message = match rejection {
            JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
            JsonRejection::JsonSyntaxError(_) => "Malformed JSON request body",
            _ => "Invalid request body",
        };
        AppError::Validation(message.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the letter backend.
pub type Result<T> = std::result::Result<T, AppError>;
