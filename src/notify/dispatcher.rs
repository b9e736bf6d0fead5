//! Fire-and-forget notification dispatch.
//!
//! `dispatch` spawns a detached task and returns immediately. The request
//! that triggered it never awaits the handle; the task's result is only
//! logged. Identical messages delivered within the de-duplication window
//! are not sent again.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::notify::{Notification, NotificationTransport, TransportError};

/// Final state of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    Failed,
    /// An identical message was handled within the de-duplication window
    Suppressed,
}

/// Sends notifications in the background through a transport.
#[derive(Clone)]
pub struct NotificationDispatcher {
    transport: Arc<dyn NotificationTransport>,
    recent: Arc<Mutex<TtlCache<String, DeliveryStatus>>>,
    timeout: Duration,
}

impl NotificationDispatcher {
    /// # Arguments
    /// * `transport` - Sink that performs delivery
    /// * `timeout` - Upper bound on one delivery attempt
    /// * `dedup_ttl` - How long an identical message is suppressed
    pub fn new(
        transport: Arc<dyn NotificationTransport>,
        timeout: Duration,
        dedup_ttl: Duration,
    ) -> Self {
        Self {
            transport,
            recent: Arc::new(Mutex::new(TtlCache::new(dedup_ttl, Some(1000)))),
            timeout,
        }
    }

    /// Starts delivery on a detached task.
    ///
    /// The returned handle may be dropped; the task keeps running.
    pub fn dispatch(&self, notification: Notification) -> JoinHandle<DeliveryStatus> {
        let this = self.clone();
        tokio::spawn(async move { this.deliver(notification).await })
    }

    async fn deliver(&self, notification: Notification) -> DeliveryStatus {
        let key = notification.dedup_key();

        if let Some(previous) = self.recent.lock().await.get(&key) {
            debug!(subject = %notification.subject, ?previous, "Duplicate notification suppressed");
            return DeliveryStatus::Suppressed;
        }

        let attempt = tokio::time::timeout(self.timeout, self.transport.deliver(&notification));
        let status = match attempt.await.unwrap_or(Err(TransportError::Timeout)) {
            Ok(()) => {
                info!(
                    transport = self.transport.name(),
                    subject = %notification.subject,
                    "Notification delivered"
                );
                DeliveryStatus::Delivered
            }
            Err(e) => {
                warn!(
                    transport = self.transport.name(),
                    subject = %notification.subject,
                    error = %e,
                    "Notification delivery failed"
                );
                DeliveryStatus::Failed
            }
        };

        self.recent.lock().await.set(key, status);
        status
    }

    /// Drops expired de-duplication records. Returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        self.recent.lock().await.cleanup_expired()
    }
}
