//! Configuration models
//!
//! Every section carries serde defaults so a config file only needs to list
//! its backends.

pub mod backend;
pub mod cache;
pub mod dispatcher;
pub mod health;
pub mod logging;
pub mod rate_limit;
pub mod retry;

pub use backend::*;
pub use cache::*;
pub use dispatcher::*;
pub use health::*;
pub use logging::*;
pub use rate_limit::*;
pub use retry::*;

use std::time::Duration;

// Default value functions

pub fn default_true() -> bool {
    true
}

pub fn default_backend_timeout() -> Duration {
    Duration::from_secs(60)
}

pub fn default_max_retries() -> u32 {
    3
}

pub fn default_weight() -> u32 {
    1
}

pub fn default_rate_limit_per_minute() -> u32 {
    60
}

pub fn default_cache_max_entries() -> usize {
    1000
}

pub fn default_cache_max_bytes() -> usize {
    64 * 1024 * 1024
}

pub fn default_cache_ttl() -> Duration {
    Duration::from_secs(3600)
}

pub fn default_sweep_every_puts() -> u64 {
    256
}

pub fn default_rate_limit_window() -> Duration {
    Duration::from_secs(60)
}

pub fn default_acquire_timeout() -> Duration {
    Duration::from_secs(30)
}

pub fn default_base_delay() -> Duration {
    Duration::from_millis(500)
}

pub fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

pub fn default_failure_threshold() -> u32 {
    3
}

pub fn default_probe_interval() -> Duration {
    Duration::from_secs(30)
}

pub fn default_deadline() -> Duration {
    Duration::from_secs(120)
}

pub fn default_log_level() -> String {
    "info".to_string()
}
