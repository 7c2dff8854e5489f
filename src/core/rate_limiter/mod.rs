//! Rate Limiting Implementation
//!
//! Per-backend token buckets, refilled lazily on every call. Each bucket also
//! keeps a log of recent grants so that no rolling window ever admits more
//! than the configured rate, even right after a full bucket is drained.

mod limiter;
mod types;


pub use limiter::RateLimiter;
pub use types::RateLimitResult;
