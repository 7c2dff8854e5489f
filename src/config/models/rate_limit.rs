//! Rate limiting configuration

use super::*;
use crate::utils::serde_duration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Global rate limiting parameters; per-backend rates live on `BackendConfig`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLimitConfig {
    /// Window the per-backend rate is expressed over
    #[serde(default = "default_rate_limit_window", with = "serde_duration::secs")]
    pub window: Duration,
    /// Longest a request waits for a token before moving to another backend
    #[serde(default = "default_acquire_timeout", with = "serde_duration::secs")]
    pub acquire_timeout: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: default_rate_limit_window(),
            acquire_timeout: default_acquire_timeout(),
        }
    }
}
