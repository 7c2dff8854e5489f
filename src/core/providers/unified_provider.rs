//! Unified backend error handling
//!
//! Every failed backend attempt is classified into one [`ProviderError`] at the
//! adapter boundary. The retry executor and dispatcher only look at the
//! classification, never at provider-specific payloads.
//!
//! | Variant | HTTP Status | Class | Request-specific |
//! |------|------------|--------|--------|
//! | Authentication | 401/403 | Fatal | No |
//! | RateLimit | 429 | Retryable | No |
//! | QuotaExceeded | 402 | Fatal | No |
//! | ModelNotFound | 404 | Fatal | No |
//! | InvalidRequest | 400 | Fatal | Yes |
//! | ContextLengthExceeded | 413 | Fatal | Yes |
//! | Network | 503 | Retryable | No |
//! | Timeout | 408 | Retryable | No |
//! | ProviderUnavailable | 503 | Retryable | No |
//! | ApiError | actual | Retryable for 408/429/5xx | No |
//! | ResponseParsing | 502 | Fatal | No |
//! | Configuration | 500 | Fatal | No |
//! | Other | 500 | Fatal | No |
//!
//! ## Usage
//!
//! ```rust
//! use llm_dispatch::core::providers::unified_provider::{FailureClass, ProviderError};
//! use std::time::Duration;
//!
//! let err = ProviderError::rate_limit("primary", Some(Duration::from_secs(2)));
//! assert_eq!(err.failure_class(), FailureClass::Retryable);
//! assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
//!
//! let err = ProviderError::authentication("primary", "Invalid API key");
//! assert!(!err.is_retryable());
//! assert!(!err.is_request_specific());
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry classification of a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Re-attempting the same call could plausibly succeed
    Retryable,
    /// Re-attempting the same call against the same backend cannot succeed
    Fatal,
}

/// Unified backend error type
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("Authentication failed for {backend}: {message}")]
    Authentication { backend: String, message: String },

    #[error("Rate limit exceeded for {backend}: {message}")]
    RateLimit {
        backend: String,
        message: String,
        /// Server-provided hint for when to try again
        retry_after: Option<Duration>,
    },

    #[error("Quota exceeded for {backend}: {message}")]
    QuotaExceeded { backend: String, message: String },

    #[error("Model '{model}' not found for {backend}")]
    ModelNotFound { backend: String, model: String },

    #[error("Invalid request for {backend}: {message}")]
    InvalidRequest { backend: String, message: String },

    #[error("Context length exceeded for {backend}: {message}")]
    ContextLengthExceeded { backend: String, message: String },

    #[error("Network error for {backend}: {message}")]
    Network { backend: String, message: String },

    #[error("Timeout for {backend}: {message}")]
    Timeout { backend: String, message: String },

    #[error("Backend {backend} is unavailable: {message}")]
    ProviderUnavailable { backend: String, message: String },

    #[error("API error for {backend} (status {status}): {message}")]
    ApiError {
        backend: String,
        status: u16,
        message: String,
    },

    #[error("Failed to parse {backend} response: {message}")]
    ResponseParsing { backend: String, message: String },

    #[error("Configuration error for {backend}: {message}")]
    Configuration { backend: String, message: String },

    #[error("{backend} error: {message}")]
    Other { backend: String, message: String },
}

impl ProviderError {
    /// Create authentication error
    pub fn authentication(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Authentication {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create rate limit error
    pub fn rate_limit(backend: impl Into<String>, retry_after: Option<Duration>) -> Self {
        let message = match retry_after {
            Some(delay) => format!("retry after {:.1}s", delay.as_secs_f64()),
            None => "too many requests".to_string(),
        };
        Self::RateLimit {
            backend: backend.into(),
            message,
            retry_after,
        }
    }

    /// Create rate limit error with the provider's message
    pub fn rate_limit_with_message(
        backend: impl Into<String>,
        message: impl Into<String>,
        retry_after: Option<Duration>,
    ) -> Self {
        Self::RateLimit {
            backend: backend.into(),
            message: message.into(),
            retry_after,
        }
    }

    pub fn quota_exceeded(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QuotaExceeded {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn model_not_found(backend: impl Into<String>, model: impl Into<String>) -> Self {
        Self::ModelNotFound {
            backend: backend.into(),
            model: model.into(),
        }
    }

    pub fn invalid_request(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn context_length_exceeded(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ContextLengthExceeded {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn network(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn timeout(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Timeout {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn provider_unavailable(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn api_error(backend: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            backend: backend.into(),
            status,
            message: message.into(),
        }
    }

    pub fn response_parsing(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResponseParsing {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn configuration(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn other(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Other {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Get the backend name that caused this error
    pub fn backend(&self) -> &str {
        match self {
            Self::Authentication { backend, .. }
            | Self::RateLimit { backend, .. }
            | Self::QuotaExceeded { backend, .. }
            | Self::ModelNotFound { backend, .. }
            | Self::InvalidRequest { backend, .. }
            | Self::ContextLengthExceeded { backend, .. }
            | Self::Network { backend, .. }
            | Self::Timeout { backend, .. }
            | Self::ProviderUnavailable { backend, .. }
            | Self::ApiError { backend, .. }
            | Self::ResponseParsing { backend, .. }
            | Self::Configuration { backend, .. }
            | Self::Other { backend, .. } => backend,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. }
            | Self::Timeout { .. }
            | Self::RateLimit { .. }
            | Self::ProviderUnavailable { .. } => true,

            // API errors depend on status code
            Self::ApiError { status, .. } => matches!(*status, 408 | 429 | 500..=599),

            Self::Authentication { .. }
            | Self::QuotaExceeded { .. }
            | Self::ModelNotFound { .. }
            | Self::InvalidRequest { .. }
            | Self::ContextLengthExceeded { .. }
            | Self::ResponseParsing { .. }
            | Self::Configuration { .. }
            | Self::Other { .. } => false,
        }
    }

    pub fn failure_class(&self) -> FailureClass {
        if self.is_retryable() {
            FailureClass::Retryable
        } else {
            FailureClass::Fatal
        }
    }

    /// A fatal error caused by the request itself; no other backend can do better
    pub fn is_request_specific(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. } | Self::ContextLengthExceeded { .. }
        )
    }

    /// Server-provided retry hint
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Get HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Authentication { .. } => 401,
            Self::RateLimit { .. } => 429,
            Self::QuotaExceeded { .. } => 402,
            Self::ModelNotFound { .. } => 404,
            Self::InvalidRequest { .. } => 400,
            Self::ContextLengthExceeded { .. } => 413,
            Self::Timeout { .. } => 408,
            Self::Network { .. } | Self::ProviderUnavailable { .. } => 503,
            Self::ApiError { status, .. } => *status,
            Self::ResponseParsing { .. } => 502,
            Self::Configuration { .. } | Self::Other { .. } => 500,
        }
    }
}
