//! Fixed-window rate limiter.
//!
//! Each client gets its own window whose origin is the first request after
//! the previous window elapsed. A burst straddling a window boundary can let
//! up to twice the maximum through in a short span; that is the accepted
//! cost of the fixed-window scheme.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

/// Request count for one client within its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    /// Requests admitted in this window
    pub count: u32,
    /// Instant after which the window resets
    pub reset_at: Instant,
}

/// Per-client fixed-window counter.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    windows: HashMap<String, RateWindow>,
    window: Duration,
    max_requests: u32,
}

impl FixedWindowLimiter {
    /// Creates a limiter admitting `max_requests` per `window` per client.
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            windows: HashMap::new(),
            window,
            max_requests,
        }
    }

    /// Returns true if the client must be rejected.
    ///
    /// A rejected call leaves the window untouched. An admitted call counts
    /// against the window, starting a fresh one for unseen clients or once
    /// the previous window has elapsed.
    pub fn is_limited(&mut self, client_id: &str) -> bool {
        self.is_limited_at(client_id, Instant::now())
    }

    pub(crate) fn is_limited_at(&mut self, client_id: &str, now: Instant) -> bool {
        match self.windows.get_mut(client_id) {
            Some(state) if now <= state.reset_at => {
                if state.count >= self.max_requests {
                    debug!(client = client_id, count = state.count, "Rate limit reached");
                    return true;
                }
                state.count += 1;
                false
            }
            _ => {
                self.windows.insert(
                    client_id.to_string(),
                    RateWindow {
                        count: 1,
                        reset_at: now + self.window,
                    },
                );
                false
            }
        }
    }

    /// Time until the client's current window resets, if it has one.
    pub fn retry_after(&self, client_id: &str) -> Option<Duration> {
        self.retry_after_at(client_id, Instant::now())
    }

    pub(crate) fn retry_after_at(&self, client_id: &str, now: Instant) -> Option<Duration> {
        self.windows
            .get(client_id)
            .map(|state| state.reset_at.saturating_duration_since(now))
    }

    /// Current window for a client.
    pub fn window_for(&self, client_id: &str) -> Option<RateWindow> {
        self.windows.get(client_id).copied()
    }

    /// Drops windows that have already elapsed.
    ///
    /// Returns the number of clients removed.
    pub fn cleanup_expired(&mut self) -> usize {
        self.cleanup_expired_at(Instant::now())
    }

    pub(crate) fn cleanup_expired_at(&mut self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, state| now <= state.reset_at);
        before - self.windows.len()
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}
