//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and insertion-order eviction.

mod entry;
mod order;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use order::InsertionOrder;
pub use store::TtlCache;
