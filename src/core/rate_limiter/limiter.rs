//! Core rate limiter implementation

use super::types::{RateBucket, RateLimitResult};
use crate::config::RateLimitConfig;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Per-backend rate limiter
///
/// Backends without a configured limit (or with a limit of `0`) are never
/// throttled. Each bucket has its own lock; no call ever holds two.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    buckets: DashMap<String, Arc<Mutex<RateBucket>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_window(config.window)
    }

    /// Create a rate limiter with custom window
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            buckets: DashMap::new(),
        }
    }

    /// Window the per-backend limits are expressed over
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Set the number of requests `backend` may make per window
    ///
    /// An unchanged limit keeps the current bucket state; `0` removes the limit.
    pub fn set_limit(&self, backend: &str, per_window: u32) {
        if per_window == 0 {
            self.buckets.remove(backend);
            return;
        }

        if let Some(existing) = self.buckets.get(backend) {
            if existing.lock().capacity == per_window {
                return;
            }
        }

        debug!(backend, per_window, "configuring rate limit");
        self.buckets.insert(
            backend.to_string(),
            Arc::new(Mutex::new(RateBucket::new(per_window, self.window, Instant::now()))),
        );
    }

    /// Forget a backend
    pub fn remove(&self, backend: &str) {
        self.buckets.remove(backend);
    }

    /// Keep only backends for which `keep` returns true
    pub fn retain(&self, keep: impl Fn(&str) -> bool) {
        self.buckets.retain(|name, _| keep(name));
    }

    /// Configured limit for a backend, `None` when unlimited
    pub fn limit(&self, backend: &str) -> Option<u32> {
        self.bucket(backend).map(|b| b.lock().capacity)
    }

    fn bucket(&self, backend: &str) -> Option<Arc<Mutex<RateBucket>>> {
        self.buckets.get(backend).map(|entry| entry.value().clone())
    }

    /// Take a token if one is available right now
    pub fn try_acquire(&self, backend: &str) -> RateLimitResult {
        match self.bucket(backend) {
            Some(bucket) => bucket.lock().try_acquire(Instant::now()),
            None => RateLimitResult {
                allowed: true,
                limit: 0,
                remaining: u32::MAX,
                retry_after: None,
            },
        }
    }

    /// Current state of a backend's bucket without consuming a token
    pub fn status(&self, backend: &str) -> Option<RateLimitResult> {
        self.bucket(backend)
            .map(|bucket| bucket.lock().peek(Instant::now()))
    }

    /// Wait up to `timeout` for a token
    ///
    /// Returns `false` once it is clear no token can be granted before the
    /// timeout elapses. The bucket lock is never held while sleeping.
    pub async fn acquire(&self, backend: &str, timeout: Duration) -> bool {
        let Some(bucket) = self.bucket(backend) else {
            return true;
        };

        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            let result = bucket.lock().try_acquire(now);
            if result.allowed {
                return true;
            }

            let wait = result.retry_after.unwrap_or(Duration::from_millis(1));
            let remaining = deadline.saturating_duration_since(now);
            if wait > remaining {
                debug!(
                    backend,
                    wait_ms = wait.as_millis() as u64,
                    "rate limit wait exceeds acquire timeout"
                );
                return false;
            }

            tokio::time::sleep(wait).await;
        }
    }
}
