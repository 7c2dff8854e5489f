//! Monitoring records and aggregates

use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Number of recent attempts kept per backend for rate and latency figures
pub const RECENT_WINDOW: usize = 100;

/// How one attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    RetryableFailure,
    FatalFailure,
    CacheHit,
}

impl AttemptOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::RetryableFailure | Self::FatalFailure)
    }
}

/// One observation
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// Backend name; `None` for cache hits
    pub backend: Option<String>,
    pub timestamp: Instant,
    pub latency: Duration,
    pub outcome: AttemptOutcome,
}

impl AttemptRecord {
    pub fn attempt(backend: impl Into<String>, latency: Duration, outcome: AttemptOutcome) -> Self {
        Self {
            backend: Some(backend.into()),
            timestamp: Instant::now(),
            latency,
            outcome,
        }
    }

    pub fn cache_hit() -> Self {
        Self {
            backend: None,
            timestamp: Instant::now(),
            latency: Duration::ZERO,
            outcome: AttemptOutcome::CacheHit,
        }
    }
}

/// Running totals for one backend
#[derive(Debug, Default)]
pub(super) struct BackendAggregate {
    pub total_attempts: u64,
    pub successes: u64,
    pub retryable_failures: u64,
    pub fatal_failures: u64,
    pub last_attempt_at: Option<Instant>,
    pub recent: VecDeque<(AttemptOutcome, Duration)>,
}

impl BackendAggregate {
    pub fn apply(&mut self, record: &AttemptRecord) {
        self.total_attempts += 1;
        match record.outcome {
            AttemptOutcome::Success => self.successes += 1,
            AttemptOutcome::RetryableFailure => self.retryable_failures += 1,
            AttemptOutcome::FatalFailure => self.fatal_failures += 1,
            AttemptOutcome::CacheHit => {}
        }
        self.last_attempt_at = Some(match self.last_attempt_at {
            Some(previous) => previous.max(record.timestamp),
            None => record.timestamp,
        });
        if self.recent.len() == RECENT_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back((record.outcome, record.latency));
    }

    pub fn performance(&self, backend: &str) -> BackendPerformance {
        let recent = self.recent.len();
        let (success_rate, recent_latency_ms) = if recent == 0 {
            (None, None)
        } else {
            let successes = self
                .recent
                .iter()
                .filter(|(outcome, _)| *outcome == AttemptOutcome::Success)
                .count();
            let total_ms: f64 = self
                .recent
                .iter()
                .map(|(_, latency)| latency.as_secs_f64() * 1000.0)
                .sum();
            (
                Some(successes as f64 / recent as f64),
                Some(total_ms / recent as f64),
            )
        };

        BackendPerformance {
            backend: backend.to_string(),
            total_attempts: self.total_attempts,
            successes: self.successes,
            retryable_failures: self.retryable_failures,
            fatal_failures: self.fatal_failures,
            success_rate,
            recent_latency_ms,
        }
    }
}

/// Read-only view of one backend's performance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendPerformance {
    pub backend: String,
    pub total_attempts: u64,
    pub successes: u64,
    pub retryable_failures: u64,
    pub fatal_failures: u64,
    /// Share of successful attempts among the recent window
    pub success_rate: Option<f64>,
    /// Mean latency of the recent window, in milliseconds
    pub recent_latency_ms: Option<f64>,
}

impl BackendPerformance {
    pub fn empty(backend: &str) -> Self {
        BackendAggregate::default().performance(backend)
    }
}

/// Totals across all backends
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorSummary {
    pub total_attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub cache_hits: u64,
}
