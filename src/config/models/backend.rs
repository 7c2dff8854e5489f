//! Backend configuration

use super::*;
use crate::utils::serde_duration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wire protocol family spoken by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// `/chat/completions` style APIs (OpenAI, vLLM, LM Studio, DeepSeek, ...)
    #[serde(alias = "openai")]
    OpenaiCompatible,
    /// `/messages` style APIs
    #[serde(alias = "anthropic", alias = "claude")]
    AnthropicCompatible,
    /// Ollama native `/api/chat`
    #[serde(alias = "ollama")]
    Local,
}

impl BackendKind {
    /// Whether an API key must be configured for this kind
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Local)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenaiCompatible => "openai_compatible",
            Self::AnthropicCompatible => "anthropic_compatible",
            Self::Local => "local",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one provider endpoint
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    /// Unique backend name
    pub name: String,
    /// Protocol family
    pub kind: BackendKind,
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// API key; may be empty when `api_key_env` is set or the backend is local
    #[serde(default)]
    pub api_key: String,
    /// Environment variable to read the key from when `api_key` is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Model identifier sent to the backend
    pub model: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Per-attempt timeout
    #[serde(default = "default_backend_timeout", with = "serde_duration::secs")]
    pub timeout: Duration,
    /// Attempts against this backend before falling back
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Relative share of traffic
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Requests granted per rate-limit window; `0` disables limiting
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("api_key_env", &self.api_key_env)
            .field("model", &self.model)
            .field("enabled", &self.enabled)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("weight", &self.weight)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}

impl BackendConfig {
    /// Create a backend config with default limits
    pub fn new(
        name: impl Into<String>,
        kind: BackendKind,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            base_url: base_url.into(),
            api_key: String::new(),
            api_key_env: None,
            model: model.into(),
            enabled: true,
            timeout: default_backend_timeout(),
            max_retries: default_max_retries(),
            weight: default_weight(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_rate_limit(mut self, per_minute: u32) -> Self {
        self.rate_limit_per_minute = per_minute;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The API key to send, consulting `api_key_env` when `api_key` is empty
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        self.api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty())
    }

    /// Attempts the retry executor makes against this backend
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}
