//! Backoff delay calculation

use crate::config::RetryConfig;
use rand::Rng;
use std::time::Duration;

/// Exponential backoff with optional full jitter
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    base_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl Backoff {
    pub fn new(base_delay: Duration, max_delay: Duration, jitter: bool) -> Self {
        Self {
            base_delay,
            max_delay,
            jitter,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.base_delay, config.max_delay, config.jitter)
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Upper bound of the sleep before retry `retry` (1-based): `base * 2^(retry-1)`, capped
    pub fn ceiling(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Sleep before retry `retry`
    ///
    /// With jitter the sleep is uniform in `[0, ceiling]`. A server-provided
    /// `retry_after` raises the sleep to at least that value, never above the cap.
    pub fn delay(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        let ceiling = self.ceiling(retry);
        let delay = if self.jitter && !ceiling.is_zero() {
            let nanos = u64::try_from(ceiling.as_nanos()).unwrap_or(u64::MAX);
            Duration::from_nanos(rand::thread_rng().gen_range(0..=nanos))
        } else {
            ceiling
        };

        match retry_after {
            Some(hint) => delay.max(hint).min(self.max_delay),
            None => delay,
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
