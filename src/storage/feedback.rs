//! Feedback messages and the response store.
//!
//! Messages are append-only. Listings are served from a short-lived cache
//! that every save invalidates.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::cache::TtlCache;
use crate::error::{AppError, Result};
use crate::storage::json_file;

const LISTING_KEY: &str = "responses";

/// A stored feedback message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackMessage {
    pub id: Uuid,
    pub additional_info: String,
    pub created_at: DateTime<Utc>,
}

/// Document store holding feedback messages.
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    async fn insert(&self, message: &FeedbackMessage) -> Result<()>;

    /// All messages, newest first.
    async fn list_newest_first(&self) -> Result<Vec<FeedbackMessage>>;
}

// == In-memory repository ==
#[derive(Debug, Default)]
pub struct MemoryFeedbackRepository {
    messages: RwLock<Vec<FeedbackMessage>>,
}

impl MemoryFeedbackRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedbackRepository for MemoryFeedbackRepository {
    async fn insert(&self, message: &FeedbackMessage) -> Result<()> {
        self.messages.write().await.push(message.clone());
        Ok(())
    }

    async fn list_newest_first(&self) -> Result<Vec<FeedbackMessage>> {
        let mut messages = self.messages.read().await.clone();
        sort_newest_first(&mut messages);
        Ok(messages)
    }
}

// == JSON file repository ==
/// Keeps every message in one JSON document.
#[derive(Debug)]
pub struct JsonFileFeedbackRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileFeedbackRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl FeedbackRepository for JsonFileFeedbackRepository {
    async fn insert(&self, message: &FeedbackMessage) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut messages: Vec<FeedbackMessage> = json_file::read_collection(&self.path).await?;
        messages.push(message.clone());
        json_file::write_collection(&self.path, &messages).await
    }

    async fn list_newest_first(&self) -> Result<Vec<FeedbackMessage>> {
        let mut messages: Vec<FeedbackMessage> = json_file::read_collection(&self.path).await?;
        sort_newest_first(&mut messages);
        Ok(messages)
    }
}

fn sort_newest_first(messages: &mut [FeedbackMessage]) {
    // Equal timestamps keep the later insert first
    messages.reverse();
    messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

// == Response Store ==
/// Validating front for a feedback repository with a cached listing.
pub struct ResponseStore {
    repo: Arc<dyn FeedbackRepository>,
    listing: RwLock<TtlCache<&'static str, Vec<FeedbackMessage>>>,
    /// Bumped on every save so a listing fetched before a save is not cached
    generation: AtomicU64,
}

impl ResponseStore {
    pub fn new(repo: Arc<dyn FeedbackRepository>, listing_ttl: Duration) -> Self {
        Self {
            repo,
            listing: RwLock::new(TtlCache::new(listing_ttl, Some(1))),
            generation: AtomicU64::new(0),
        }
    }

    /// Validates and persists a message, then invalidates the listing.
    pub async fn save(&self, additional_info: &str) -> Result<FeedbackMessage> {
        let text = additional_info.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Message is required".to_string()));
        }

        let message = FeedbackMessage {
            id: Uuid::now_v7(),
            additional_info: text.to_string(),
            created_at: Utc::now(),
        };

        if let Err(e) = self.repo.insert(&message).await {
            error!(error = %e, "Failed to save response");
            return Err(e);
        }

        self.generation.fetch_add(1, Ordering::SeqCst);
        self.listing.write().await.clear();
        info!(id = %message.id, "Response saved");

        Ok(message)
    }

    /// All messages, newest first, possibly from cache.
    pub async fn list(&self) -> Result<Vec<FeedbackMessage>> {
        if let Some(cached) = self.listing.write().await.get(&LISTING_KEY) {
            debug!(count = cached.len(), "Serving cached responses");
            return Ok(cached);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let messages = self.repo.list_newest_first().await.map_err(|e| {
            error!(error = %e, "Failed to get responses");
            e
        })?;

        let mut listing = self.listing.write().await;
        if self.generation.load(Ordering::SeqCst) == generation {
            listing.set(LISTING_KEY, messages.clone());
        }

        Ok(messages)
    }

    /// Drops the cached listing if it has expired.
    pub async fn cleanup_expired(&self) -> usize {
        self.listing.write().await.cleanup_expired()
    }
}
