//! Top-level dispatcher configuration

use super::*;
use crate::utils::serde_duration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Everything needed to construct a `Dispatcher`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DispatcherConfig {
    /// Backends in priority order
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub health: HealthConfig,
    /// Deadline applied to requests that do not carry their own
    #[serde(
        default,
        with = "serde_duration::opt_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_deadline: Option<Duration>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DispatcherConfig {
    pub fn new(backends: Vec<BackendConfig>) -> Self {
        Self {
            backends,
            ..Default::default()
        }
    }

    /// Backends that take part in selection
    pub fn enabled_backends(&self) -> impl Iterator<Item = &BackendConfig> {
        self.backends.iter().filter(|b| b.enabled)
    }

    /// Look up a backend by name
    pub fn backend(&self, name: &str) -> Option<&BackendConfig> {
        self.backends.iter().find(|b| b.name == name)
    }

    /// The deadline for a request that did not specify one
    pub fn effective_default_deadline(&self) -> Duration {
        self.default_deadline.unwrap_or_else(default_deadline)
    }
}
