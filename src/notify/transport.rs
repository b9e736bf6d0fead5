//! Notification transports.
//!
//! A transport is the external sink that actually delivers a message. The
//! dispatcher never lets a transport error reach the request path.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::notify::Notification;

/// Why a delivery attempt failed.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Transport could not be reached
    #[error("transport unreachable: {0}")]
    Unreachable(String),

    /// Transport answered but refused the message
    #[error("transport rejected message: {0}")]
    Rejected(String),

    /// Delivery attempt exceeded its time budget
    #[error("delivery timed out")]
    Timeout,
}

/// Sink capable of delivering a notification.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), TransportError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

// == Log Transport ==
/// Writes notifications to the log instead of sending them.
///
/// Used when no relay is configured.
#[derive(Debug, Default, Clone)]
pub struct LogTransport;

#[async_trait]
impl NotificationTransport for LogTransport {
    async fn deliver(&self, notification: &Notification) -> Result<(), TransportError> {
        info!(
            to = %notification.to,
            subject = %notification.subject,
            "Notification (log transport)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

// == HTTP Relay Transport ==
/// Posts the notification as JSON to an HTTP mail relay.
#[derive(Debug, Clone)]
pub struct HttpRelayTransport {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpRelayTransport {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            token,
        }
    }
}

#[async_trait]
impl NotificationTransport for HttpRelayTransport {
    async fn deliver(&self, notification: &Notification) -> Result<(), TransportError> {
        let mut request = self.client.post(&self.url).json(notification);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Rejected(format!("relay returned {}", status)))
        }
    }

    fn name(&self) -> &'static str {
        "http-relay"
    }
}
