//! API Handlers
//!
//! HTTP request handlers for each letter endpoint.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{debug, info};

use super::json::ApiJson;
use crate::cache::TtlCache;
use crate::config::Config;
use crate::credentials::{Credential, CredentialValidator, ValidationOutcome};
use crate::error::{AppError, Result};
use crate::limiter::FixedWindowLimiter;
use crate::models::{
    DataResponse, HealthResponse, IndexResponse, SubmitRequest, SubmitResponse, SuccessResponse,
    ValidateRequest,
};
use crate::notify::{
    HttpRelayTransport, LogTransport, Notification, NotificationDispatcher, NotificationSettings,
    NotificationTransport,
};
use crate::storage::{
    FeedbackMessage, FeedbackRepository, JsonFileFeedbackRepository, ResponseStore, VisitRecord,
    VisitTracker, RESPONSES_FILE, TRACKING_FILE,
};

/// Application state shared across all handlers.
///
/// Everything is built once at startup and injected; nothing lives in
/// module-level statics.
#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<CredentialValidator>,
    /// Outcomes keyed by normalized name and dob
    pub validation_cache: Arc<RwLock<TtlCache<String, ValidationOutcome>>>,
    pub limiter: Arc<RwLock<FixedWindowLimiter>>,
    pub dispatcher: NotificationDispatcher,
    pub notify_settings: Arc<NotificationSettings>,
    pub responses: Arc<ResponseStore>,
    pub visits: Arc<VisitTracker>,
    /// Rate limit by `X-Forwarded-For` rather than the peer address
    pub trust_forwarded_for: bool,
}

impl AppState {
    /// Creates a new AppState with explicit notification and feedback
    /// collaborators. Visits are kept under the configured data directory.
    pub fn new(
        config: &Config,
        transport: Arc<dyn NotificationTransport>,
        feedback: Arc<dyn FeedbackRepository>,
    ) -> Self {
        Self {
            validator: Arc::new(CredentialValidator::new(
                &config.valid_names,
                config.user_dob.clone(),
            )),
            validation_cache: Arc::new(RwLock::new(TtlCache::new(
                config.validation_cache_ttl(),
                Some(config.validation_cache_max),
            ))),
            limiter: Arc::new(RwLock::new(FixedWindowLimiter::new(
                config.rate_limit_window(),
                config.rate_limit_max,
            ))),
            dispatcher: NotificationDispatcher::new(
                transport,
                config.notify_timeout(),
                config.notify_dedup_ttl(),
            ),
            notify_settings: Arc::new(NotificationSettings {
                sender: config.notify_sender.clone(),
                receiver: config.notify_receiver.clone(),
                utc_offset: config.notify_utc_offset(),
            }),
            responses: Arc::new(ResponseStore::new(feedback, config.responses_cache_ttl())),
            visits: Arc::new(VisitTracker::new(config.data_dir.join(TRACKING_FILE))),
            trust_forwarded_for: config.trust_forwarded_for,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Notifications go to the HTTP relay when one is configured and to the
    /// log otherwise. Feedback is stored as JSON in the data directory.
    pub fn from_config(config: &Config) -> Self {
        let transport: Arc<dyn NotificationTransport> = match &config.notify_relay_url {
            Some(url) if !config.notify_receiver.is_empty() => Arc::new(HttpRelayTransport::new(
                url.clone(),
                config.notify_relay_token.clone(),
            )),
            _ => Arc::new(LogTransport),
        };
        let feedback = Arc::new(JsonFileFeedbackRepository::new(
            config.data_dir.join(RESPONSES_FILE),
        ));

        Self::new(config, transport, feedback)
    }
}

/// Handler for GET /
pub async fn index_handler() -> Json<IndexResponse> {
    Json(IndexResponse::new())
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for POST /api/validate
///
/// Checks a name and date of birth. Outcomes are cached, so a repeated
/// attempt is answered from the cache without another login alert. The
/// alert for a fresh success is dispatched in the background and never
/// affects the response.
pub async fn validate_handler(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ValidateRequest>,
) -> Result<Json<ValidationOutcome>> {
    if let Some(error_msg) = req.validate() {
        return Err(AppError::Validation(error_msg));
    }

    let credential = Credential::new(&req.name, &req.dob);
    let key = credential.cache_key();

    if let Some(cached) = state.validation_cache.write().await.get(&key) {
        debug!(success = cached.is_success(), "Serving cached validation outcome");
        return Ok(Json(cached));
    }

    let outcome = state.validator.validate(&credential);
    state
        .validation_cache
        .write()
        .await
        .set(key, outcome.clone());

    if outcome.is_success() {
        info!("Credential accepted");
        let settings = &state.notify_settings;
        let alert = Notification::login_alert(settings, req.name.trim(), &req.dob, settings.now());
        state.dispatcher.dispatch(alert);
    } else {
        info!("Credential rejected");
    }

    Ok(Json(outcome))
}

/// Handler for POST /api/submit
///
/// Stores a feedback message, then notifies the owner in the background.
pub async fn submit_handler(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SubmitRequest>,
) -> Result<Json<SubmitResponse>> {
    let message = state.responses.save(&req.additional_info).await?;

    let settings = &state.notify_settings;
    let notice = Notification::feedback_received(settings, &message.additional_info, settings.now());
    state.dispatcher.dispatch(notice);

    Ok(Json(SubmitResponse::submitted()))
}

/// Handler for GET /api/responses
///
/// All feedback messages, newest first.
pub async fn responses_handler(State(state): State<AppState>) -> Result<Json<Vec<FeedbackMessage>>> {
    Ok(Json(state.responses.list().await?))
}

/// Handler for GET /api/track
pub async fn list_visits_handler(State(state): State<AppState>) -> Result<Json<Vec<VisitRecord>>> {
    Ok(Json(state.visits.list().await?))
}

/// Handler for POST /api/track
pub async fn record_visit_handler(
    State(state): State<AppState>,
    ApiJson(entry): ApiJson<VisitRecord>,
) -> Result<Json<DataResponse<VisitRecord>>> {
    let saved = state.visits.record(entry).await?;
    Ok(Json(DataResponse::new(saved)))
}

/// Handler for PUT /api/track/:id
pub async fn update_visit_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(entry): ApiJson<VisitRecord>,
) -> Result<Json<DataResponse<VisitRecord>>> {
    let updated = state.visits.update(&id, entry).await?;
    Ok(Json(DataResponse::new(updated)))
}

/// Handler for DELETE /api/track/:id
pub async fn delete_visit_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    state.visits.delete_one(&id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Handler for DELETE /api/track
pub async fn delete_all_visits_handler(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse>> {
    state.visits.delete_all().await?;
    Ok(Json(SuccessResponse::ok()))
}
