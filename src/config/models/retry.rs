//! Retry configuration

use super::*;
use crate::utils::serde_duration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff parameters shared by all backends
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Delay before the first retry
    #[serde(default = "default_base_delay", with = "serde_duration::secs")]
    pub base_delay: Duration,
    /// Upper bound for any single backoff sleep
    #[serde(default = "default_max_delay", with = "serde_duration::secs")]
    pub max_delay: Duration,
    /// Randomize sleeps uniformly in `[0, delay]`
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay: default_base_delay(),
            max_delay: default_max_delay(),
            jitter: true,
        }
    }
}
