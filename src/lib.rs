//! # llm-dispatch
//!
//! A resilient dispatch layer for interchangeable LLM backends.
//!
//! A [`Dispatcher`] sits between text-generation code and the network. For
//! every request it:
//!
//! - serves identical requests from a TTL + LRU response cache,
//! - picks a backend by smooth weighted round-robin over healthy backends,
//! - throttles calls with a per-backend rolling rate limit,
//! - retries transient failures with exponential backoff and jitter,
//! - falls back to the next backend when one is exhausted,
//! - records every attempt for health and performance reporting.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use llm_dispatch::{CompletionRequest, DispatcherConfig, Dispatcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DispatcherConfig::from_file("config/dispatch.yaml").await?;
//!     let dispatcher = Dispatcher::new(config)?;
//!
//!     let response = dispatcher
//!         .complete(CompletionRequest::new("Write a haiku about rust").with_max_tokens(64))
//!         .await?;
//!     println!("{} (via {:?})", response.text, response.backend_used);
//!
//!     for status in dispatcher.get_backend_status() {
//!         println!("{}: {}", status.name, status.health);
//!     }
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod utils;

// Re-export main types
pub use config::{
    BackendConfig, BackendKind, CacheConfig, DispatcherConfig, HealthConfig, LoggingConfig,
    RateLimitConfig, RetryConfig,
};
pub use core::cache_manager::{CacheKey, CacheStats, ResponseCache};
pub use core::dispatcher::{BackendStatus, Dispatcher, ProbeResult};
pub use core::monitoring::{AttemptOutcome, PerformanceMonitor};
pub use core::providers::{Backend, FailureClass, ProviderError, RawCompletion};
pub use core::rate_limiter::RateLimiter;
pub use core::router::HealthStatus;
pub use core::types::{CompletionRequest, CompletionResponse, GenerationParams};
pub use utils::error::{BackendFailure, DispatchError, Result};
pub use utils::logging::init_logging;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
