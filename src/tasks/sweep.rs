//! Expiry Sweep Task
//!
//! Background task that periodically drops expired validation outcomes,
//! rate-limit windows, notification de-duplication records and the cached
//! response listing. Reads already ignore expired data; the sweep only
//! bounds memory.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::AppState;

/// Counts of what one sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub validations: usize,
    pub rate_windows: usize,
    pub notifications: usize,
    pub listings: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.validations + self.rate_windows + self.notifications + self.listings
    }
}

/// Runs one sweep over every expiring structure in `state`.
pub async fn sweep_once(state: &AppState) -> SweepReport {
    SweepReport {
        validations: state.validation_cache.write().await.cleanup_expired(),
        rate_windows: state.limiter.write().await.cleanup_expired(),
        notifications: state.dispatcher.cleanup_expired().await,
        listings: state.responses.cleanup_expired().await,
    }
}

/// Spawns a background task that sweeps `state` every `interval_secs`.
///
/// The returned handle is used to abort the task during graceful shutdown.
///
/// # Example
/// ```ignore
/// let sweep_handle = spawn_sweep_task(state.clone(), 60);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(state: AppState, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!("Starting expiry sweep with interval of {} seconds", interval.as_secs());

        loop {
            tokio::time::sleep(interval).await;

            let report = sweep_once(&state).await;
            if report.total() > 0 {
                info!(
                    validations = report.validations,
                    rate_windows = report.rate_windows,
                    notifications = report.notifications,
                    listings = report.listings,
                    "Expiry sweep removed entries"
                );
            } else {
                debug!("Expiry sweep: nothing expired");
            }
        }
    })
}
