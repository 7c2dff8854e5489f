//! Backend health tracking
//!
//! Each backend moves through `Healthy -> Degraded -> Unhealthy` as
//! consecutive failures accumulate; any success returns it to `Healthy`.
//! Unhealthy backends are offered at most one probe request per probe interval.

use crate::config::HealthConfig;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Operational classification of a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Whether normal selection may pick this backend
    pub fn is_selectable(&self) -> bool {
        !matches!(self, Self::Unhealthy)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        };
        f.write_str(s)
    }
}

/// Mutable health record of one backend
#[derive(Debug, Clone, PartialEq)]
pub struct BackendHealthState {
    pub consecutive_failures: u32,
    pub status: HealthStatus,
    pub last_failure_at: Option<Instant>,
    pub last_success_at: Option<Instant>,
    /// When the last probe of an unhealthy backend was granted
    pub last_probe_at: Option<Instant>,
}

impl Default for BackendHealthState {
    fn default() -> Self {
        Self {
            consecutive_failures: 0,
            status: HealthStatus::Healthy,
            last_failure_at: None,
            last_success_at: None,
            last_probe_at: None,
        }
    }
}

impl BackendHealthState {
    /// Record a success; returns the previous status
    pub fn record_success(&mut self, now: Instant) -> HealthStatus {
        let previous = self.status;
        self.consecutive_failures = 0;
        self.status = HealthStatus::Healthy;
        self.last_success_at = Some(now);
        previous
    }

    /// Record a failure; returns the previous status
    pub fn record_failure(&mut self, now: Instant, failure_threshold: u32) -> HealthStatus {
        let previous = self.status;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_failure_at = Some(now);
        self.status = if self.consecutive_failures >= failure_threshold.max(1) {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Degraded
        };
        previous
    }

    /// An unhealthy backend whose last failure or probe is at least `interval` old
    pub fn probe_due(&self, now: Instant, interval: std::time::Duration) -> bool {
        if self.status != HealthStatus::Unhealthy {
            return false;
        }
        let since = match (self.last_failure_at, self.last_probe_at) {
            (Some(failure), Some(probe)) => failure.max(probe),
            (Some(at), None) | (None, Some(at)) => at,
            (None, None) => return true,
        };
        now.saturating_duration_since(since) >= interval
    }
}

/// Health records for every registered backend
#[derive(Debug)]
pub struct HealthTracker {
    config: HealthConfig,
    states: DashMap<String, Arc<Mutex<BackendHealthState>>>,
}

impl HealthTracker {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            states: DashMap::new(),
        }
    }

    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    /// Start tracking a backend; existing state is kept
    pub fn register(&self, backend: &str) {
        if !self.states.contains_key(backend) {
            self.states
                .entry(backend.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(BackendHealthState::default())));
        }
    }

    /// Keep only backends for which `keep` returns true
    pub fn retain(&self, keep: impl Fn(&str) -> bool) {
        self.states.retain(|name, _| keep(name));
    }

    /// Health record of a registered backend
    ///
    /// Never creates one: outcomes that arrive for a backend removed by a
    /// reload are dropped instead of reviving its state.
    fn state(&self, backend: &str) -> Option<Arc<Mutex<BackendHealthState>>> {
        self.states.get(backend).map(|state| state.value().clone())
    }

    pub fn record_success(&self, backend: &str) {
        let Some(state) = self.state(backend) else {
            debug!(backend, "ignoring success for unregistered backend");
            return;
        };
        let previous = state.lock().record_success(Instant::now());
        if previous != HealthStatus::Healthy {
            info!(backend, from = %previous, "backend recovered");
        }
    }

    pub fn record_failure(&self, backend: &str) {
        let Some(state) = self.state(backend) else {
            debug!(backend, "ignoring failure for unregistered backend");
            return;
        };
        let (previous, current, failures) = {
            let mut state = state.lock();
            let previous = state.record_failure(Instant::now(), self.config.failure_threshold);
            (previous, state.status, state.consecutive_failures)
        };
        if previous != current {
            warn!(
                backend,
                from = %previous,
                to = %current,
                consecutive_failures = failures,
                "backend health changed"
            );
        }
    }

    pub fn status(&self, backend: &str) -> HealthStatus {
        self.snapshot(backend).status
    }

    /// Copy of a backend's current health record
    pub fn snapshot(&self, backend: &str) -> BackendHealthState {
        self.states
            .get(backend)
            .map(|state| state.lock().clone())
            .unwrap_or_default()
    }

    /// Grant a probe to an unhealthy backend if one is due
    ///
    /// The check and the bookkeeping happen under one lock, so concurrent
    /// callers get at most one probe per interval.
    pub fn try_claim_probe(&self, backend: &str, now: Instant) -> bool {
        let Some(state) = self.state(backend) else {
            return false;
        };
        let mut state = state.lock();
        if state.probe_due(now, self.config.probe_interval) {
            state.last_probe_at = Some(now);
            true
        } else {
            false
        }
    }

    /// Record that a probe was sent regardless of schedule
    pub fn mark_probed(&self, backend: &str, now: Instant) {
        if let Some(state) = self.state(backend) {
            state.lock().last_probe_at = Some(now);
        }
    }

    /// Hand back a probe claimed at `claimed_at` that never reached the backend
    ///
    /// The next selection may probe again right away. A probe claimed later
    /// by someone else is left alone.
    pub fn release_probe(&self, backend: &str, claimed_at: Instant) {
        if let Some(state) = self.state(backend) {
            let mut state = state.lock();
            if state.last_probe_at == Some(claimed_at) {
                state.last_probe_at = None;
            }
        }
    }
}
