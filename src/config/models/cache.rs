//! Cache configuration

use super::*;
use crate::utils::serde_duration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// Enable caching
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum number of entries
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
    /// Maximum total size of cached values in bytes
    #[serde(default = "default_cache_max_bytes")]
    pub max_bytes: usize,
    /// TTL applied to stored responses
    #[serde(default = "default_cache_ttl", with = "serde_duration::secs")]
    pub default_ttl: Duration,
    /// JSON file the cache is persisted to; `None` keeps it in memory only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_path: Option<PathBuf>,
    /// Run an expiry sweep every this many puts
    #[serde(default = "default_sweep_every_puts")]
    pub sweep_every_puts: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_cache_max_entries(),
            max_bytes: default_cache_max_bytes(),
            default_ttl: default_cache_ttl(),
            persist_path: None,
            sweep_every_puts: default_sweep_every_puts(),
        }
    }
}
