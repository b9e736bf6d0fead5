//! JSON body extractor whose rejections use the API error shape.

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` with malformed or mistyped bodies reported as a 400
/// `{"success": false, "message": ...}` instead of axum's plain-text 4xx.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
