//! The backend capability contract

use crate::config::BackendConfig;
use crate::core::providers::unified_provider::ProviderError;
use crate::core::types::CompletionRequest;
use async_trait::async_trait;
use std::fmt::Debug;

/// Text returned by one successful backend call
#[derive(Debug, Clone, PartialEq)]
pub struct RawCompletion {
    pub text: String,
    /// Model the backend reports having used, when it says so
    pub model: Option<String>,
}

impl RawCompletion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
        }
    }
}

/// One configured LLM endpoint
///
/// Implementations perform exactly one network exchange per `send` and
/// classify any failure into a [`ProviderError`]. They must not retry
/// internally.
///
/// ```rust,ignore
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct Echo(BackendConfig);
///
/// #[async_trait]
/// impl Backend for Echo {
///     fn config(&self) -> &BackendConfig {
///         &self.0
///     }
///
///     async fn send(&self, request: &CompletionRequest) -> Result<RawCompletion, ProviderError> {
///         Ok(RawCompletion::new(request.prompt.clone()))
///     }
/// }
/// ```
#[async_trait]
pub trait Backend: Send + Sync + Debug + 'static {
    /// Static description of this backend
    fn config(&self) -> &BackendConfig;

    /// Unique backend name
    fn name(&self) -> &str {
        &self.config().name
    }

    /// Perform one completion call
    async fn send(&self, request: &CompletionRequest) -> Result<RawCompletion, ProviderError>;
}
