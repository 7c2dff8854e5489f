//! Dispatcher construction and backend reloading

use super::registry::BackendRegistry;
use crate::config::{BackendConfig, DispatcherConfig, RateLimitConfig};
use crate::core::cache_manager::ResponseCache;
use crate::core::monitoring::PerformanceMonitor;
use crate::core::providers::{Backend, build_backends, build_http_client};
use crate::core::rate_limiter::RateLimiter;
use crate::core::retry::{Backoff, RetryExecutor};
use crate::core::router::{HealthTracker, LoadBalancer};
use crate::utils::error::Result;
use arc_swap::ArcSwap;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Resilient front door to a set of LLM backends
///
/// Cheap to share: wrap it in an `Arc` and call
/// [`complete`](Dispatcher::complete) from as many tasks as needed.
#[derive(Debug)]
pub struct Dispatcher {
    /// Settings other than the backend list
    pub(super) settings: DispatcherConfig,
    pub(super) registry: ArcSwap<BackendRegistry>,
    pub(super) cache: Arc<ResponseCache>,
    pub(super) rate_limiter: RateLimiter,
    pub(super) health: Arc<HealthTracker>,
    pub(super) balancer: LoadBalancer,
    pub(super) executor: RetryExecutor,
    pub(super) monitor: Arc<PerformanceMonitor>,
    client: Client,
}

impl Dispatcher {
    /// Build a dispatcher with HTTP adapters for every configured backend
    pub fn new(config: DispatcherConfig) -> Result<Self> {
        config.validate_all()?;
        let client = build_http_client()?;
        let backends = build_backends(&config.backends, &client);
        Self::assemble(config, backends, client)
    }

    /// Build a dispatcher around already constructed backends
    ///
    /// `config.backends` is ignored; the backends' own configurations are used.
    pub fn with_backends(config: DispatcherConfig, backends: Vec<Arc<dyn Backend>>) -> Result<Self> {
        let mut config = config;
        config.backends = backends.iter().map(|b| b.config().clone()).collect();
        config.validate_all()?;
        let client = build_http_client()?;
        Self::assemble(config, backends, client)
    }

    fn assemble(
        mut config: DispatcherConfig,
        backends: Vec<Arc<dyn Backend>>,
        client: Client,
    ) -> Result<Self> {
        config.backends.clear();

        let health = Arc::new(HealthTracker::new(config.health.clone()));
        let monitor = Arc::new(PerformanceMonitor::new());
        let dispatcher = Self {
            cache: Arc::new(ResponseCache::new(config.cache.clone())),
            rate_limiter: RateLimiter::new(&config.rate_limit),
            balancer: LoadBalancer::new(health.clone()),
            executor: RetryExecutor::new(Backoff::from_config(&config.retry), monitor.clone()),
            registry: ArcSwap::from_pointee(BackendRegistry::default()),
            health,
            monitor,
            settings: config,
            client,
        };
        dispatcher.install(backends);
        Ok(dispatcher)
    }

    /// Replace the backend set from configuration
    ///
    /// Validates first; on error the current backends stay in place.
    pub fn reload(&self, backends: Vec<BackendConfig>) -> Result<()> {
        let mut candidate = self.settings.clone();
        candidate.backends = backends;
        candidate.validate_all()?;
        let backends = build_backends(&candidate.backends, &self.client);
        self.install(backends);
        Ok(())
    }

    /// Replace the backend set with already constructed backends
    pub fn reload_backends(&self, backends: Vec<Arc<dyn Backend>>) -> Result<()> {
        let mut candidate = self.settings.clone();
        candidate.backends = backends.iter().map(|b| b.config().clone()).collect();
        candidate.validate_all()?;
        self.install(backends);
        Ok(())
    }

    /// Register state for new backends, drop state of removed ones, then publish
    fn install(&self, backends: Vec<Arc<dyn Backend>>) {
        for backend in &backends {
            self.health.register(backend.name());
            self.monitor.register(backend.name());
            self.rate_limiter
                .set_limit(backend.name(), backend.config().rate_limit_per_minute);
        }

        let names: HashSet<String> = backends.iter().map(|b| b.name().to_string()).collect();
        let keep = |name: &str| names.contains(name);
        self.health.retain(keep);
        self.rate_limiter.retain(keep);
        self.balancer.retain(keep);
        self.monitor.retain(keep);

        let registry = BackendRegistry::new(backends);
        info!(
            backends = registry.len(),
            enabled = registry.selectable().len(),
            "backend registry installed"
        );
        self.registry.store(Arc::new(registry));
    }

    /// Current backend snapshot
    pub fn registry(&self) -> Arc<BackendRegistry> {
        self.registry.load_full()
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn monitor(&self) -> &Arc<PerformanceMonitor> {
        &self.monitor
    }

    pub fn rate_limits(&self) -> &RateLimitConfig {
        &self.settings.rate_limit
    }

    /// Deadline applied to requests that carry none
    pub fn default_deadline(&self) -> Duration {
        self.settings.effective_default_deadline()
    }
}
