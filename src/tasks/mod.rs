//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: Drops expired cache entries, rate windows and
//!   notification de-duplication records at the configured interval

mod sweep;

pub use sweep::{spawn_sweep_task, sweep_once, SweepReport};
