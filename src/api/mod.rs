//! API Module
//!
//! HTTP handlers and routing for the letter REST API.
//!
//! # Endpoints
//! - `GET /` - Endpoint index
//! - `GET /health` - Health check endpoint
//! - `POST /api/validate` - Check a name and date of birth
//! - `POST /api/submit` - Store a feedback message
//! - `GET /api/responses` - List feedback messages
//! - `/api/track[/:id]` - Visit tracking CRUD

pub mod client;
pub mod handlers;
pub mod json;
pub mod middleware;
pub mod routes;

pub use client::ClientId;
pub use handlers::*;
pub use json::ApiJson;
pub use routes::create_router;
