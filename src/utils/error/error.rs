//! Error handling for the dispatch layer
//!
//! `DispatchError` is the single structured error a caller of
//! [`Dispatcher::complete`](crate::core::dispatcher::Dispatcher::complete) can observe.
//! Per-attempt failures are [`ProviderError`]s and only surface here in aggregated form.

use crate::core::providers::unified_provider::ProviderError;
use thiserror::Error;

/// Result type alias for the dispatch layer
pub type Result<T> = std::result::Result<T, DispatchError>;

/// The last failure observed on one backend while serving a request
#[derive(Debug, Clone)]
pub struct BackendFailure {
    /// Backend name
    pub backend: String,
    /// The error that ended work on this backend
    pub error: ProviderError,
    /// Attempts spent on this backend
    pub attempts: u32,
}

impl std::fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} attempt{}): {}",
            self.backend,
            self.attempts,
            if self.attempts == 1 { "" } else { "s" },
            self.error
        )
    }
}

fn summarize(failures: &[BackendFailure]) -> String {
    if failures.is_empty() {
        return "no backend was tried".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Main error type for the dispatch layer
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The request was rejected before any backend interaction
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No enabled backend is configured
    #[error("No backends available: {0}")]
    NoBackendsAvailable(String),

    /// A backend rejected the request itself; no other backend can do better
    #[error("Request rejected by {backend}: {error}")]
    Fatal {
        backend: String,
        error: ProviderError,
        attempts: u32,
    },

    /// Every eligible backend failed
    #[error("All backends failed after {attempts} attempts: {}", summarize(.failures))]
    Exhausted {
        failures: Vec<BackendFailure>,
        attempts: u32,
    },

    /// The caller's deadline elapsed before a response was produced
    #[error("Deadline exceeded after {attempts} attempts: {}", summarize(.failures))]
    DeadlineExceeded {
        failures: Vec<BackendFailure>,
        attempts: u32,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client construction errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatchError {
    /// Total backend attempts made before this error was returned
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. }
            | Self::DeadlineExceeded { attempts, .. }
            | Self::Fatal { attempts, .. } => *attempts,
            _ => 0,
        }
    }

    /// Per-backend failures collected while serving the request
    pub fn failures(&self) -> &[BackendFailure] {
        match self {
            Self::Exhausted { failures, .. } | Self::DeadlineExceeded { failures, .. } => failures,
            _ => &[],
        }
    }

    /// Whether the caller's deadline ended the request
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded { .. })
    }
}
