//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};

use crate::error::{AppError, Result};

/// Server configuration parameters.
///
/// The allow-list and expected date of birth are required; everything else
/// has a default.
#[derive(Debug, Clone)]
pub struct Config {
    /// Names that may open the letter
    pub valid_names: Vec<String>,
    /// Expected date of birth, compared verbatim
    pub user_dob: String,
    /// HTTP server port
    pub server_port: u16,
    /// Directory holding the JSON document files
    pub data_dir: PathBuf,
    /// Lifetime of cached validation outcomes in seconds
    pub validation_cache_ttl: u64,
    /// Maximum cached validation outcomes
    pub validation_cache_max: usize,
    /// Lifetime of the cached response listing in seconds
    pub responses_cache_ttl: u64,
    /// Rate limit window in seconds
    pub rate_limit_window: u64,
    /// Validation attempts allowed per window
    pub rate_limit_max: u32,
    /// Background sweep interval in seconds
    pub cleanup_interval: u64,
    /// Sender address on notifications
    pub notify_sender: String,
    /// Recipient of notifications
    pub notify_receiver: String,
    /// HTTP mail relay; notifications are only logged when unset
    pub notify_relay_url: Option<String>,
    /// Bearer token for the relay
    pub notify_relay_token: Option<String>,
    /// Per-attempt delivery timeout in seconds
    pub notify_timeout: u64,
    /// Window in seconds during which identical notifications are not resent
    pub notify_dedup_ttl: u64,
    /// Offset used when rendering timestamps in notifications
    pub notify_utc_offset_minutes: i32,
    /// CORS origins; any origin when empty
    pub allowed_origins: Vec<String>,
    /// Key rate limiting on the first `X-Forwarded-For` hop instead of the
    /// peer address. Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

fn parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn flag(name: &str) -> bool {
    optional(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

fn required(name: &str) -> Result<String> {
    optional(name).ok_or_else(|| {
        AppError::Configuration(format!("Missing required environment variable: {}", name))
    })
}

/// Parses the allow-list: a JSON array of strings, or a comma-separated list.
pub fn parse_name_list(raw: &str) -> Result<Vec<String>> {
    let raw = raw.trim();
    let names: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str(raw).map_err(|e| {
            AppError::Configuration(format!("VALID_USERNAMES is not a JSON string array: {}", e))
        })?
    } else {
        raw.split(',').map(str::to_string).collect()
    };

    let names: Vec<String> = names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();

    if names.is_empty() {
        return Err(AppError::Configuration(
            "VALID_USERNAMES contains no names".to_string(),
        ));
    }
    Ok(names)
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt)
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|v| {
        v.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// The binary loads a `.env` file into the environment before calling this.
    ///
    /// # Environment Variables
    /// - `VALID_USERNAMES` - Allowed names (required)
    /// - `USER_DOB` - Expected date of birth (required)
    /// - `SERVER_PORT` or `PORT` - HTTP server port (default: 3000)
    /// - `DATA_DIR` - Document directory (default: data)
    /// - `VALIDATION_CACHE_TTL` / `VALIDATION_CACHE_MAX` (default: 300 / 1000)
    /// - `RESPONSES_CACHE_TTL` (default: 300)
    /// - `RATE_LIMIT_WINDOW` / `RATE_LIMIT_MAX` (default: 900 / 5)
    /// - `CLEANUP_INTERVAL` (default: 60)
    /// - `NOTIFY_SENDER`, `NOTIFY_RECEIVER`, `NOTIFY_RELAY_URL`, `NOTIFY_RELAY_TOKEN`
    /// - `NOTIFY_TIMEOUT` / `NOTIFY_DEDUP_TTL` (default: 10 / 300)
    /// - `NOTIFY_UTC_OFFSET_MINUTES` (default: 330)
    /// - `ALLOWED_ORIGINS` - Comma-separated CORS origins (default: any)
    /// - `TRUST_FORWARDED_FOR` - Rate limit by `X-Forwarded-For` (default: false)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let valid_names = parse_name_list(&required("VALID_USERNAMES")?)?;
        let user_dob = required("USER_DOB")?;

        let server_port = optional("SERVER_PORT")
            .or_else(|| optional("PORT"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.server_port);

        let notify_utc_offset_minutes =
            parsed("NOTIFY_UTC_OFFSET_MINUTES", defaults.notify_utc_offset_minutes);
        if offset_from_minutes(notify_utc_offset_minutes).is_none() {
            return Err(AppError::Configuration(format!(
                "NOTIFY_UTC_OFFSET_MINUTES out of range: {}",
                notify_utc_offset_minutes
            )));
        }

        Ok(Self {
            valid_names,
            user_dob,
            server_port,
            data_dir: optional("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            validation_cache_ttl: parsed("VALIDATION_CACHE_TTL", defaults.validation_cache_ttl),
            validation_cache_max: parsed("VALIDATION_CACHE_MAX", defaults.validation_cache_max),
            responses_cache_ttl: parsed("RESPONSES_CACHE_TTL", defaults.responses_cache_ttl),
            rate_limit_window: parsed("RATE_LIMIT_WINDOW", defaults.rate_limit_window),
            rate_limit_max: parsed("RATE_LIMIT_MAX", defaults.rate_limit_max),
            cleanup_interval: parsed("CLEANUP_INTERVAL", defaults.cleanup_interval).max(1),
            notify_sender: optional("NOTIFY_SENDER").unwrap_or(defaults.notify_sender),
            notify_receiver: optional("NOTIFY_RECEIVER").unwrap_or(defaults.notify_receiver),
            notify_relay_url: optional("NOTIFY_RELAY_URL"),
            notify_relay_token: optional("NOTIFY_RELAY_TOKEN"),
            notify_timeout: parsed("NOTIFY_TIMEOUT", defaults.notify_timeout),
            notify_dedup_ttl: parsed("NOTIFY_DEDUP_TTL", defaults.notify_dedup_ttl),
            notify_utc_offset_minutes,
            allowed_origins: split_list(optional("ALLOWED_ORIGINS")),
            trust_forwarded_for: flag("TRUST_FORWARDED_FOR"),
        })
    }

    pub fn validation_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.validation_cache_ttl)
    }

    pub fn responses_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.responses_cache_ttl)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout)
    }

    pub fn notify_dedup_ttl(&self) -> Duration {
        Duration::from_secs(self.notify_dedup_ttl)
    }

    /// Display offset for notification timestamps, UTC if out of range.
    pub fn notify_utc_offset(&self) -> FixedOffset {
        offset_from_minutes(self.notify_utc_offset_minutes).unwrap_or_else(|| Utc.fix())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            valid_names: Vec::new(),
            user_dob: String::new(),
            server_port: 3000,
            data_dir: PathBuf::from("data"),
            validation_cache_ttl: 300,
            validation_cache_max: 1000,
            responses_cache_ttl: 300,
            rate_limit_window: 15 * 60,
            rate_limit_max: 5,
            cleanup_interval: 60,
            notify_sender: "letter-app@localhost".to_string(),
            notify_receiver: String::new(),
            notify_relay_url: None,
            notify_relay_token: None,
            notify_timeout: 10,
            notify_dedup_ttl: 300,
            notify_utc_offset_minutes: 330,
            allowed_origins: Vec::new(),
            trust_forwarded_for: false,
        }
    }
}
