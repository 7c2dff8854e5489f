//! Backend implementations
//!
//! Every provider speaks through the [`Backend`] trait. The adapters here only
//! translate a [`CompletionRequest`](crate::core::types::CompletionRequest)
//! into one HTTP call and classify the outcome; retries, fallback and caching
//! live in the dispatcher.

pub mod anthropic_compatible;
pub mod backend;
pub mod local;
pub mod openai_compatible;
pub mod registry;
pub mod shared;
pub mod unified_provider;

pub use anthropic_compatible::AnthropicCompatibleBackend;
pub use backend::{Backend, RawCompletion};
pub use local::LocalBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use registry::{build_backend, build_backends, build_http_client};
pub use unified_provider::{FailureClass, ProviderError};
