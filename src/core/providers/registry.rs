//! Backend construction from configuration

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::anthropic_compatible::AnthropicCompatibleBackend;
use super::backend::Backend;
use super::local::LocalBackend;
use super::openai_compatible::OpenAICompatibleBackend;
use crate::config::{BackendConfig, BackendKind};
use crate::utils::error::Result;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the HTTP client shared by all adapters
pub fn build_http_client() -> Result<Client> {
    let client = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("llm-dispatch/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Build the adapter for one backend
pub fn build_backend(config: &BackendConfig, client: &Client) -> Arc<dyn Backend> {
    debug!(backend = %config.name, kind = %config.kind, "building backend");
    match config.kind {
        BackendKind::OpenaiCompatible => {
            Arc::new(OpenAICompatibleBackend::new(config.clone(), client.clone()))
        }
        BackendKind::AnthropicCompatible => {
            Arc::new(AnthropicCompatibleBackend::new(config.clone(), client.clone()))
        }
        BackendKind::Local => Arc::new(LocalBackend::new(config.clone(), client.clone())),
    }
}

/// Build adapters for every configured backend, in order
pub fn build_backends(configs: &[BackendConfig], client: &Client) -> Vec<Arc<dyn Backend>> {
    configs.iter().map(|c| build_backend(c, client)).collect()
}
