//! The request path
//!
//! `Start -> CacheCheck -> (hit) | Select -> RateLimit -> Execute -> (success | next backend | fatal)`

use super::dispatcher::Dispatcher;
use crate::core::cache_manager::CacheKey;
use crate::core::providers::ProviderError;
use crate::core::retry::Execution;
use crate::core::types::{CompletionRequest, CompletionResponse};
use crate::utils::error::{BackendFailure, DispatchError, Result};
use std::collections::HashSet;
use tokio::time::Instant;
use tracing::{debug, warn};

impl Dispatcher {
    /// Produce a completion for `request`
    ///
    /// Served from cache when possible. Otherwise backends are tried one at a
    /// time in selection order, each with its own retry budget, until one
    /// succeeds, a request-specific rejection ends the request, every enabled
    /// backend has been tried, or the deadline passes.
    ///
    /// A backend whose rate limit cannot grant a slot within
    /// `rate_limit.acquire_timeout` is skipped. The limiter gives up as soon
    /// as the wait is known to exceed that timeout, without sleeping first.
    pub async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        request.validate()?;

        let registry = self.registry.load_full();
        if registry.selectable().is_empty() {
            return Err(DispatchError::NoBackendsAvailable(
                "no enabled backend is configured".to_string(),
            ));
        }

        let deadline = Instant::now() + request.deadline.unwrap_or(self.default_deadline());

        let cache_key = (self.cache.config().enabled && request.use_cache)
            .then(|| CacheKey::from_request(&request));
        if let Some(key) = &cache_key {
            if let Some(text) = self.cache.get(key) {
                self.monitor.record_cache_hit();
                debug!(key = %key, "served from cache");
                return Ok(CompletionResponse::from_cache(text));
            }
        }

        let mut tried: HashSet<String> = HashSet::new();
        let mut failures: Vec<BackendFailure> = Vec::new();
        let mut attempts: u32 = 0;

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(DispatchError::DeadlineExceeded { failures, attempts });
            }

            let Some(selection) = self.balancer.select(registry.selectable(), &tried) else {
                break;
            };
            tried.insert(selection.name.clone());
            let Some(backend) = registry.get(&selection.name) else {
                continue;
            };
            let name = backend.name();
            debug!(backend = name, probe = selection.probe, "selected backend");

            let acquire_timeout = self.settings.rate_limit.acquire_timeout.min(deadline - now);
            if !self.rate_limiter.acquire(name, acquire_timeout).await {
                self.balancer.release(&selection);
                warn!(
                    backend = name,
                    timeout_ms = acquire_timeout.as_millis() as u64,
                    "rate limit slot not available, trying next backend"
                );
                failures.push(BackendFailure {
                    backend: name.to_string(),
                    error: ProviderError::rate_limit_with_message(
                        name,
                        format!("no local rate limit slot within {:?}", acquire_timeout),
                        None,
                    ),
                    attempts: 0,
                });
                continue;
            }

            match self.executor.execute(backend.as_ref(), &request, deadline).await {
                Execution::Success {
                    completion,
                    attempts: used,
                } => {
                    attempts += used;
                    self.health.record_success(name);
                    if let Some(key) = &cache_key {
                        self.cache.put(key.clone(), completion.text.clone());
                    }
                    return Ok(CompletionResponse {
                        text: completion.text,
                        backend_used: Some(name.to_string()),
                        cached: false,
                        attempts,
                    });
                }
                Execution::Failed { error, attempts: used } => {
                    attempts += used;
                    if error.is_request_specific() {
                        return Err(DispatchError::Fatal {
                            backend: name.to_string(),
                            error,
                            attempts,
                        });
                    }
                    self.health.record_failure(name);
                    failures.push(BackendFailure {
                        backend: name.to_string(),
                        error,
                        attempts: used,
                    });
                }
                Execution::DeadlineExceeded {
                    last_error,
                    attempts: used,
                } => {
                    attempts += used;
                    if let Some(error) = last_error {
                        failures.push(BackendFailure {
                            backend: name.to_string(),
                            error,
                            attempts: used,
                        });
                    }
                    return Err(DispatchError::DeadlineExceeded { failures, attempts });
                }
            }
        }

        warn!(
            backends = failures.len(),
            attempts, "every eligible backend failed"
        );
        Err(DispatchError::Exhausted { failures, attempts })
    }
}
