//! Response cache
//!
//! Content-addressed cache of generated text with TTL expiry, LRU eviction
//! under an entry-count and byte budget, and optional best-effort persistence
//! to a JSON file.

pub mod manager;
pub mod persistence;
pub mod types;


pub use manager::ResponseCache;
pub use types::{CacheEntry, CacheKey, CacheStats};
