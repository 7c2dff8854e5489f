//! Health tracking configuration

use super::*;
use crate::utils::serde_duration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Health state machine parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthConfig {
    /// Consecutive failures that make a backend unhealthy
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Minimum spacing between probe requests to an unhealthy backend
    #[serde(default = "default_probe_interval", with = "serde_duration::secs")]
    pub probe_interval: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            probe_interval: default_probe_interval(),
        }
    }
}
