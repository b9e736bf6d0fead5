//! Outbound notification messages.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// Display name and address of the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mailbox {
    pub name: String,
    pub address: String,
}

/// A message handed to a transport for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub from: Mailbox,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub headers: BTreeMap<String, String>,
    /// Time-independent content identifying the message for de-duplication
    #[serde(skip)]
    pub payload: String,
}

/// Addressing and display settings shared by every notification.
#[derive(Debug, Clone)]
pub struct NotificationSettings {
    pub sender: String,
    pub receiver: String,
    pub utc_offset: FixedOffset,
}

impl NotificationSettings {
    /// Current time in the configured display offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.utc_offset)
    }
}

/// Formats a timestamp as e.g. `Friday, October 16, 2026 at 5:30:00 PM +05:30`.
pub fn display_timestamp(at: &DateTime<FixedOffset>) -> String {
    at.format("%A, %B %-d, %Y at %-I:%M:%S %p %:z").to_string()
}

/// Escapes the characters that matter inside HTML text content.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn priority_headers() -> BTreeMap<String, String> {
    [
        ("X-Priority", "1"),
        ("X-MSMail-Priority", "High"),
        ("Importance", "high"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Notification {
    /// Alert sent after a visitor passes the credential check.
    pub fn login_alert(
        settings: &NotificationSettings,
        name: &str,
        dob: &str,
        at: DateTime<FixedOffset>,
    ) -> Self {
        let when = display_timestamp(&at);
        let mut headers = priority_headers();
        headers.insert("X-Notification-Type".into(), "login_alert".into());
        headers.insert("X-Auto-Response-Suppress".into(), "OOF, AutoReply".into());
        headers.insert("X-Entity-Ref-ID".into(), at.timestamp_millis().to_string());

        Self {
            from: Mailbox {
                name: "Letter App Alert".into(),
                address: settings.sender.clone(),
            },
            to: settings.receiver.clone(),
            subject: "New Login Alert".into(),
            text: format!(
                "New Login Alert!\n\nName: {}\nDOB: {}\nTime: {}",
                name, dob, when
            ),
            html: format!(
                "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
                 <h1 style=\"color: #e91e63;\">New Login Alert</h1>\
                 <p><strong>Name:</strong> {}</p>\
                 <p><strong>DOB:</strong> {}</p>\
                 <p><strong>Time:</strong> {}</p>\
                 </div>",
                escape_html(name),
                escape_html(dob),
                escape_html(&when)
            ),
            headers,
            payload: format!("{}\n{}", name, dob),
        }
    }

    /// Notice sent after a feedback message is stored.
    pub fn feedback_received(
        settings: &NotificationSettings,
        additional_info: &str,
        at: DateTime<FixedOffset>,
    ) -> Self {
        let when = display_timestamp(&at);
        let mut headers = priority_headers();
        headers.insert("X-Notification-Type".into(), "feedback".into());

        Self {
            from: Mailbox {
                name: "Letter App".into(),
                address: settings.sender.clone(),
            },
            to: settings.receiver.clone(),
            subject: "New Response".into(),
            text: format!(
                "New Response\n\nMessage:\n{}\n\nReceived on: {}",
                additional_info, when
            ),
            html: format!(
                "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
                 <h2 style=\"color: #e91e63;\">New Response</h2>\
                 <p><strong>Message:</strong></p>\
                 <p>{}</p>\
                 <p style=\"color: #666; font-size: 14px;\">Received on: {}</p>\
                 </div>",
                escape_html(additional_info),
                escape_html(&when)
            ),
            headers,
            payload: additional_info.to_string(),
        }
    }

    /// Key shared by messages that differ only in when they were sent.
    ///
    /// Built from recipient, subject, notification type and payload; the
    /// plain text stands in for a missing payload.
    pub fn dedup_key(&self) -> String {
        let kind = self
            .headers
            .get("X-Notification-Type")
            .map(String::as_str)
            .unwrap_or_default();
        let content = if self.payload.is_empty() {
            &self.text
        } else {
            &self.payload
        };
        format!("{}\u{1f}{}\u{1f}{}\u{1f}{}", self.to, self.subject, kind, content)
    }
}
