//! Read-side operations: backend status, cache statistics and probing

use super::dispatcher::Dispatcher;
use crate::config::BackendKind;
use crate::core::cache_manager::CacheStats;
use crate::core::monitoring::{AttemptOutcome, MonitorSummary};
use crate::core::providers::{Backend, FailureClass, ProviderError};
use crate::core::router::HealthStatus;
use crate::core::types::CompletionRequest;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Upper bound for a single probe call
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const PROBE_PROMPT: &str = "Reply with the single word: ok";
const PROBE_MAX_TOKENS: u32 = 10;

/// Snapshot of one backend as seen by the dispatcher
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendStatus {
    pub name: String,
    pub kind: BackendKind,
    pub model: String,
    pub enabled: bool,
    pub weight: u32,
    pub health: HealthStatus,
    pub consecutive_failures: u32,
    /// Mean latency of recent attempts
    pub recent_latency_ms: Option<f64>,
    /// Share of recent attempts that succeeded
    pub success_rate: Option<f64>,
    pub total_attempts: u64,
}

/// Result of probing one backend
#[derive(Debug)]
pub struct ProbeResult {
    pub backend: String,
    pub latency: Duration,
    /// Text the backend replied with, or why it failed
    pub result: Result<String, ProviderError>,
}

impl ProbeResult {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

impl Dispatcher {
    /// Status of every configured backend, in configuration order
    pub fn get_backend_status(&self) -> Vec<BackendStatus> {
        self.registry
            .load()
            .backends()
            .iter()
            .map(|backend| {
                let config = backend.config();
                let health = self.health.snapshot(backend.name());
                let performance = self.monitor.backend_performance(backend.name());
                BackendStatus {
                    name: config.name.clone(),
                    kind: config.kind,
                    model: config.model.clone(),
                    enabled: config.enabled,
                    weight: config.weight,
                    health: health.status,
                    consecutive_failures: health.consecutive_failures,
                    recent_latency_ms: performance.recent_latency_ms,
                    success_rate: performance.success_rate,
                    total_attempts: performance.total_attempts,
                }
            })
            .collect()
    }

    pub fn get_cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Totals across backends, including cache hits
    pub fn monitor_summary(&self) -> MonitorSummary {
        self.monitor.summary()
    }

    /// Empty the cache, in memory and on disk
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Wait for pending cache persistence to reach disk
    pub async fn flush(&self) {
        self.cache.flush().await;
    }

    /// Send a tiny request to every enabled backend
    ///
    /// Bypasses the cache, the rate limiter and retries. Each probe is capped at
    /// [`PROBE_TIMEOUT`]; outcomes update health like regular traffic.
    pub async fn probe_backends(&self) -> Vec<ProbeResult> {
        let registry = self.registry.load_full();
        let request = CompletionRequest::new(PROBE_PROMPT)
            .with_max_tokens(PROBE_MAX_TOKENS)
            .with_cache(false);

        let probes = registry
            .backends()
            .iter()
            .filter(|b| b.config().enabled)
            .map(|backend| self.probe_one(backend.clone(), &request));
        let results = join_all(probes).await;

        let healthy = results.iter().filter(|r| r.is_ok()).count();
        info!(probed = results.len(), healthy, "backend probe finished");
        results
    }

    async fn probe_one(&self, backend: Arc<dyn Backend>, request: &CompletionRequest) -> ProbeResult {
        let name = backend.name().to_string();
        let budget = backend.config().timeout.min(PROBE_TIMEOUT);
        let started = Instant::now();

        let result = match tokio::time::timeout(budget, backend.send(request)).await {
            Ok(Ok(completion)) => Ok(completion.text),
            Ok(Err(error)) => Err(error),
            Err(_) => Err(ProviderError::timeout(
                &name,
                format!("probe got no response within {:?}", budget),
            )),
        };
        let latency = started.elapsed();

        match &result {
            Ok(_) => {
                self.health.record_success(&name);
                self.monitor
                    .record_attempt(&name, latency, AttemptOutcome::Success);
            }
            Err(error) => {
                self.health.record_failure(&name);
                let outcome = match error.failure_class() {
                    FailureClass::Retryable => AttemptOutcome::RetryableFailure,
                    FailureClass::Fatal => AttemptOutcome::FatalFailure,
                };
                self.monitor.record_attempt(&name, latency, outcome);
            }
        }

        ProbeResult {
            backend: name,
            latency,
            result,
        }
    }
}
