//! Configuration and request fixtures

use super::backends::ScriptedBackend;
use llm_dispatch::{Backend, CompletionRequest, Dispatcher, DispatcherConfig};
use std::sync::Arc;
use std::time::Duration;

/// Default configuration with millisecond backoff and no jitter
pub fn fast_config() -> DispatcherConfig {
    let mut config = DispatcherConfig::default();
    config.retry.base_delay = Duration::from_millis(10);
    config.retry.max_delay = Duration::from_millis(40);
    config.retry.jitter = false;
    config.rate_limit.acquire_timeout = Duration::from_secs(1);
    config
}

pub fn dispatcher(config: DispatcherConfig, backends: &[Arc<ScriptedBackend>]) -> Dispatcher {
    let backends: Vec<Arc<dyn Backend>> = backends.iter().map(|b| b.as_backend()).collect();
    Dispatcher::with_backends(config, backends).expect("valid test dispatcher")
}

pub fn request(prompt: &str) -> CompletionRequest {
    CompletionRequest::new(prompt).with_max_tokens(64)
}

/// Request that neither reads nor writes the cache
pub fn uncached(prompt: &str) -> CompletionRequest {
    request(prompt).with_cache(false)
}
