//! Rate Limiter Module
//!
//! Per-client request counting for the validation endpoint.

mod window;

pub use window::{FixedWindowLimiter, RateWindow};
