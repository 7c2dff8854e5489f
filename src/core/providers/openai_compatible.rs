//! OpenAI-compatible backend
//!
//! Covers any server exposing `POST {base_url}/chat/completions`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::backend::{Backend, RawCompletion};
use super::shared::{endpoint_url, post_json};
use super::unified_provider::ProviderError;
use crate::config::BackendConfig;
use crate::core::types::CompletionRequest;

#[derive(Debug, Clone)]
pub struct OpenAICompatibleBackend {
    config: BackendConfig,
    http_client: Client,
    api_key: Option<String>,
}

impl OpenAICompatibleBackend {
    pub fn new(config: BackendConfig, http_client: Client) -> Self {
        let api_key = config.resolved_api_key();
        Self {
            config,
            http_client,
            api_key,
        }
    }

    fn build_body(&self, request: &CompletionRequest) -> Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": request.prompt}));

        json!({
            "model": request.model_or(&self.config.model),
            "messages": messages,
            "temperature": request.params.temperature,
            "top_p": request.params.top_p,
            "max_tokens": request.params.max_tokens,
            "stream": false,
        })
    }

    fn parse_response(&self, body: &Value) -> Result<RawCompletion, ProviderError> {
        let choice = body
            .get("choices")
            .and_then(|c| c.get(0))
            .ok_or_else(|| ProviderError::response_parsing(&self.config.name, "no choices in response"))?;

        let text = choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .or_else(|| choice.get("text").and_then(|t| t.as_str()))
            .ok_or_else(|| {
                ProviderError::response_parsing(&self.config.name, "choice has no text content")
            })?;

        Ok(RawCompletion {
            text: text.to_string(),
            model: body.get("model").and_then(|m| m.as_str()).map(str::to_string),
        })
    }
}

#[async_trait]
impl Backend for OpenAICompatibleBackend {
    fn config(&self) -> &BackendConfig {
        &self.config
    }

    async fn send(&self, request: &CompletionRequest) -> Result<RawCompletion, ProviderError> {
        let url = endpoint_url(&self.config.base_url, "chat/completions");
        let mut builder = self.http_client.post(&url).json(&self.build_body(request));
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
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
