//! Anthropic-compatible backend
//!
//! `POST {base_url}/messages` with `x-api-key` authentication.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::backend::{Backend, RawCompletion};
use super::shared::{endpoint_url, post_json};
use super::unified_provider::ProviderError;
use crate::config::BackendConfig;
use crate::core::types::CompletionRequest;

/// API version header sent with every request
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicCompatibleBackend {
    config: BackendConfig,
    http_client: Client,
    api_key: Option<String>,
}

impl AnthropicCompatibleBackend {
    pub fn new(config: BackendConfig, http_client: Client) -> Self {
        let api_key = config.resolved_api_key();
        Self {
            config,
            http_client,
            api_key,
        }
    }

    fn build_body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": request.model_or(&self.config.model),
            "max_tokens": request.params.max_tokens,
            "messages": [{"role": "user", "content": request.prompt}],
            "temperature": request.params.temperature,
            "top_p": request.params.top_p,
            "top_k": request.params.top_k,
        });

        if let Some(system) = &request.system {
            body["system"] = json!(system);
        }

        body
    }

    fn parse_response(&self, body: &Value) -> Result<RawCompletion, ProviderError> {
        let blocks = body
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| ProviderError::response_parsing(&self.config.name, "missing content"))?;

        let text: String = blocks
            .iter()
            .filter(|block| block.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
            .collect();

        if text.is_empty() && !blocks.is_empty() {
            return Err(ProviderError::response_parsing(
                &self.config.name,
                "response has no text blocks",
            ));
        }

        Ok(RawCompletion {
            text,
            model: body.get("model").and_then(|m| m.as_str()).map(str::to_string),
        })
    }
}

#[async_trait]
impl Backend for AnthropicCompatibleBackend {
    fn config(&self) -> &BackendConfig {
        &self.config
    }

    async fn send(&self, request: &CompletionRequest) -> Result<RawCompletion, ProviderError> {
        let url = endpoint_url(&self.config.base_url, "messages");
        let mut builder = self
            .http_client
            .post(&url)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.build_body(request));
        if let Some(api_key) = &self.api_key {
            builder = builder.header("x-api-key", api_key);
        }

        let body = post_json(
            builder,
            self.config.timeout,
            &self.config.name,
            request.model_or(&self.config.model),
        )
        .await?;
        self.parse_response(&body)
    }
}
