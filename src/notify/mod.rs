//! Notification Module
//!
//! Builds alert messages and delivers them off the request path.

mod dispatcher;
mod message;
mod transport;

pub use dispatcher::{DeliveryStatus, NotificationDispatcher};
pub use message::{display_timestamp, escape_html, Mailbox, Notification, NotificationSettings};
pub use transport::{HttpRelayTransport, LogTransport, NotificationTransport, TransportError};

#[cfg(test)]
pub(crate) use dispatcher::tests::RecordingTransport;
