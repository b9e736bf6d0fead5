//! Rate limiting for the credential check.
//!
//! Applied with `middleware::from_fn_with_state` to the validate route only.

use axum::{
    extract::{Request, State},
    http::{header::RETRY_AFTER, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::api::client::ClientId;
use crate::api::handlers::AppState;
use crate::error::AppError;

/// Rejects callers that exceeded the validation rate limit with 429.
///
/// Rejected calls never reach the handler and carry a `Retry-After` header
/// with the seconds left in the caller's window.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    request: Request,
    next: Next,
) -> Response {
    let retry_after = {
        let mut limiter = state.limiter.write().await;
        if limiter.is_limited(&client) {
            Some(limiter.retry_after(&client).unwrap_or_default())
        } else {
            None
        }
    };

    match retry_after {
        None => next.run(request).await,
        Some(wait) => {
            warn!(client = %client, "Validation rate limit exceeded");
            let mut response = AppError::RateLimited.into_response();
            // Round up so clients never retry before the window resets
            let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
            response
        }
    }
}
