//! Storage Module
//!
//! Persistence for feedback messages and visit records.

mod feedback;
mod json_file;
mod visits;

pub use feedback::{
    FeedbackMessage, FeedbackRepository, JsonFileFeedbackRepository, MemoryFeedbackRepository,
    ResponseStore,
};
pub use visits::{Progression, VisitRecord, VisitTracker};

/// File name of the feedback collection inside the data directory.
pub const RESPONSES_FILE: &str = "responses.json";

/// File name of the visit collection inside the data directory.
pub const TRACKING_FILE: &str = "tracking.json";
