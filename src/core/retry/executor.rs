//! Attempt loop for one backend

use super::backoff::Backoff;
use crate::core::monitoring::{AttemptOutcome, PerformanceMonitor};
use crate::core::providers::{Backend, FailureClass, ProviderError, RawCompletion};
use crate::core::types::CompletionRequest;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// How the attempts against one backend ended
#[derive(Debug)]
pub enum Execution {
    Success {
        completion: RawCompletion,
        attempts: u32,
    },
    /// A fatal error, or the last retryable error once attempts ran out
    Failed {
        error: ProviderError,
        attempts: u32,
    },
    /// The caller's deadline arrived first
    DeadlineExceeded {
        last_error: Option<ProviderError>,
        attempts: u32,
    },
}

impl Execution {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. }
            | Self::Failed { attempts, .. }
            | Self::DeadlineExceeded { attempts, .. } => *attempts,
        }
    }
}

/// Retries one backend with backoff until success, a fatal error, exhaustion or the deadline
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    backoff: Backoff,
    monitor: Arc<PerformanceMonitor>,
}

impl RetryExecutor {
    pub fn new(backoff: Backoff, monitor: Arc<PerformanceMonitor>) -> Self {
        Self { backoff, monitor }
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Run up to `max(1, max_retries)` attempts against `backend`
    ///
    /// Each attempt is bounded by the backend timeout and by the time left
    /// until `deadline`; backoff sleeps are clipped to the deadline too.
    pub async fn execute(
        &self,
        backend: &dyn Backend,
        request: &CompletionRequest,
        deadline: Instant,
    ) -> Execution {
        let name = backend.name();
        let max_attempts = backend.config().attempts();
        let per_attempt_timeout = backend.config().timeout;
        let mut attempts = 0;
        let mut last_error: Option<ProviderError> = None;

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Execution::DeadlineExceeded {
                    last_error,
                    attempts,
                };
            }

            let budget = per_attempt_timeout.min(deadline - now);
            attempts += 1;
            let started = Instant::now();
            let result = tokio::time::timeout(budget, backend.send(request)).await;
            let latency = started.elapsed();

            let error = match result {
                Ok(Ok(completion)) => {
                    self.monitor
                        .record_attempt(name, latency, AttemptOutcome::Success);
                    debug!(backend = name, attempts, "attempt succeeded");
                    return Execution::Success {
                        completion,
                        attempts,
                    };
                }
                Ok(Err(error)) => error,
                Err(_) => ProviderError::timeout(name, format!("no response within {:?}", budget)),
            };

            if error.failure_class() == FailureClass::Fatal {
                self.monitor
                    .record_attempt(name, latency, AttemptOutcome::FatalFailure);
                warn!(backend = name, attempt = attempts, error = %error, "fatal backend error");
                return Execution::Failed { error, attempts };
            }

            self.monitor
                .record_attempt(name, latency, AttemptOutcome::RetryableFailure);

            if Instant::now() >= deadline {
                return Execution::DeadlineExceeded {
                    last_error: Some(error),
                    attempts,
                };
            }

            if attempts >= max_attempts {
                warn!(backend = name, attempts, error = %error, "retries exhausted");
                return Execution::Failed { error, attempts };
            }

            let delay = self.backoff.delay(attempts, error.retry_after());
            let remaining = deadline.saturating_duration_since(Instant::now());
            warn!(
                backend = name,
                attempt = attempts,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "retrying after transient error"
            );
            last_error = Some(error);
            tokio::time::sleep(delay.min(remaining)).await;
        }
    }
}
