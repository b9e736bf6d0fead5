//! Request and Response models for the letter API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies. Stored
//! records (feedback messages, visits) live in `storage` and are returned
//! on the wire as-is.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{SubmitRequest, ValidateRequest};
pub use responses::{
    DataResponse, HealthResponse, IndexResponse, SubmitResponse, SuccessResponse,
    SUBMIT_SUCCESS_MESSAGE,
};
