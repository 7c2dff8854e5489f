//! Core dispatch components

pub mod cache_manager;
pub mod dispatcher;
pub mod monitoring;
pub mod providers;
pub mod rate_limiter;
pub mod retry;
pub mod router;
pub mod types;
