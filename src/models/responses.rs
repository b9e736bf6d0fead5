//! Response DTOs for the letter API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;

/// Message returned after a feedback message is stored.
pub const SUBMIT_SUCCESS_MESSAGE: &str = "Response submitted successfully";

/// Bare `{"success": true}` acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Response body for POST /api/submit
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
}

impl SubmitResponse {
    pub fn submitted() -> Self {
        Self {
            success: true,
            message: SUBMIT_SUCCESS_MESSAGE.to_string(),
        }
    }
}

/// Successful envelope around a payload, `{"success": true, "data": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for GET /
#[derive(Debug, Clone, Serialize)]
pub struct IndexResponse {
    pub message: String,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

impl IndexResponse {
    pub fn new() -> Self {
        let endpoints = [
            ("validate", "POST /api/validate"),
            ("submit", "POST /api/submit"),
            ("getResponses", "GET /api/responses"),
            ("listVisits", "GET /api/track"),
            ("recordVisit", "POST /api/track"),
            ("updateVisit", "PUT /api/track/:id"),
            ("deleteVisit", "DELETE /api/track/:id"),
            ("deleteAllVisits", "DELETE /api/track"),
            ("health", "GET /health"),
        ]
        .into_iter()
        .collect();

        Self {
            message: "Letter API Server".to_string(),
            endpoints,
        }
    }
}

impl Default for IndexResponse {
    fn default() -> Self {
        Self::new()
    }
}
