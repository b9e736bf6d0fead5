//! API Routes
//!
//! Configures the Axum router with all letter endpoints.

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use super::handlers::{
    delete_all_visits_handler, delete_visit_handler, health_handler, index_handler,
    list_visits_handler, record_visit_handler, responses_handler, submit_handler,
    update_visit_handler, validate_handler, AppState,
};
use super::middleware::rate_limit_middleware;

/// Builds the CORS layer. An empty origin list allows any origin.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /` - Endpoint index
/// - `GET /health` - Health check endpoint
/// - `POST /api/validate` - Credential check (rate limited)
/// - `POST /api/submit` - Store a feedback message
/// - `GET /api/responses` - List feedback messages
/// - `GET|POST|DELETE /api/track` - List, record or clear visits
/// - `PUT|DELETE /api/track/:id` - Replace or remove one visit
///
/// # Middleware
/// - CORS: `allowed_origins`, or any origin when empty
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    let validate = Router::new()
        .route("/validate", post(validate_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let api = Router::new()
        .merge(validate)
        .route("/submit", post(submit_handler))
        .route("/responses", get(responses_handler))
        .route(
            "/track",
            get(list_visits_handler)
                .post(record_visit_handler)
                .delete(delete_all_visits_handler),
        )
        .route(
            "/track/:id",
            put(update_visit_handler).delete(delete_visit_handler),
        );

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .nest("/api", api)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
