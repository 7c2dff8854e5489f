//! Rate limiter types and data structures

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Snapshot of one backend's limiter state
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitResult {
    /// Whether the request was granted
    pub allowed: bool,
    /// Requests granted per window
    pub limit: u32,
    /// Whole tokens left after this call
    pub remaining: u32,
    /// How long until a grant becomes possible (only set when not allowed)
    pub retry_after: Option<Duration>,
}

/// Token bucket plus rolling grant log for one backend
#[derive(Debug, Clone)]
pub(super) struct RateBucket {
    pub(super) capacity: u32,
    pub(super) tokens: f64,
    pub(super) last_refill: Instant,
    pub(super) window: Duration,
    /// Grants younger than `window`, oldest first
    pub(super) grants: VecDeque<Instant>,
}

impl RateBucket {
    pub(super) fn new(capacity: u32, window: Duration, now: Instant) -> Self {
        Self {
            capacity,
            tokens: capacity as f64,
            last_refill: now,
            window,
            grants: VecDeque::with_capacity(capacity as usize),
        }
    }

    fn tokens_per_second(&self) -> f64 {
        self.capacity as f64 / self.window.as_secs_f64()
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let new_tokens = elapsed.as_secs_f64() * self.tokens_per_second();
        self.tokens = (self.tokens + new_tokens).min(self.capacity as f64);
        self.last_refill = now.max(self.last_refill);
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.grants.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.grants.pop_front();
            } else {
                break;
            }
        }
    }

    /// Time until both a whole token and a free slot in the window exist
    fn wait_time(&self, now: Instant) -> Duration {
        let token_wait = if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.tokens_per_second())
        };

        let window_wait = if self.grants.len() >= self.capacity as usize {
            self.grants
                .front()
                .map(|&oldest| self.window.saturating_sub(now.saturating_duration_since(oldest)))
                .unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        };

        token_wait.max(window_wait).max(Duration::from_millis(1))
    }

    /// Refill, then consume one token if both the bucket and the window allow it
    pub(super) fn try_acquire(&mut self, now: Instant) -> RateLimitResult {
        self.refill(now);
        self.prune(now);

        let allowed = self.tokens >= 1.0 && self.grants.len() < self.capacity as usize;
        if allowed {
            self.tokens -= 1.0;
            self.grants.push_back(now);
        }

        RateLimitResult {
            allowed,
            limit: self.capacity,
            remaining: self.remaining(),
            retry_after: (!allowed).then(|| self.wait_time(now)),
        }
    }

    /// Refresh and report without consuming
    pub(super) fn peek(&mut self, now: Instant) -> RateLimitResult {
        self.refill(now);
        self.prune(now);
        let allowed = self.tokens >= 1.0 && self.grants.len() < self.capacity as usize;
        RateLimitResult {
            allowed,
            limit: self.capacity,
            remaining: self.remaining(),
            retry_after: (!allowed).then(|| self.wait_time(now)),
        }
    }

    fn remaining(&self) -> u32 {
        let window_slots = self.capacity.saturating_sub(self.grants.len() as u32);
        (self.tokens.floor() as u32).min(window_slots)
    }
}
