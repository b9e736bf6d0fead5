//! Letter Gate - backend for a gated letter experience
//!
//! Checks a visitor's name and date of birth, stores their written reply,
//! tracks page visits and notifies the owner without holding up requests.

pub mod api;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod error;
pub mod limiter;
pub mod models;
pub mod notify;
pub mod storage;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{AppError, Result};
pub use tasks::spawn_sweep_task;
