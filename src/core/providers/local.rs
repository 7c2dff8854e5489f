//! Local backend speaking the Ollama native chat API

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::backend::{Backend, RawCompletion};
use super::shared::{endpoint_url, post_json};
use super::unified_provider::ProviderError;
use crate::config::BackendConfig;
use crate::core::types::CompletionRequest;

#[derive(Debug, Clone)]
pub struct LocalBackend {
    config: BackendConfig,
    http_client: Client,
    api_key: Option<String>,
}

impl LocalBackend {
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
            "stream": false,
            "options": {
                "temperature": request.params.temperature,
                "top_p": request.params.top_p,
                "top_k": request.params.top_k,
                "num_predict": request.params.max_tokens,
            },
        })
    }

    fn parse_response(&self, body: &Value) -> Result<RawCompletion, ProviderError> {
        if let Some(error) = body.get("error").and_then(|e| e.as_str()) {
            return Err(ProviderError::other(&self.config.name, error));
        }

        let text = body
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .or_else(|| body.get("response").and_then(|r| r.as_str()))
            .ok_or_else(|| {
                ProviderError::response_parsing(&self.config.name, "missing message content")
            })?;

        Ok(RawCompletion {
            text: text.to_string(),
            model: body.get("model").and_then(|m| m.as_str()).map(str::to_string),
        })
    }
}

#[async_trait]
impl Backend for LocalBackend {
    fn config(&self) -> &BackendConfig {
        &self.config
    }

    async fn send(&self, request: &CompletionRequest) -> Result<RawCompletion, ProviderError> {
        let url = endpoint_url(&self.config.base_url, "api/chat");
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
