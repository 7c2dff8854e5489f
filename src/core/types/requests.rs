//! Completion request types

use crate::utils::error::{DispatchError, Result};
use crate::utils::serde_duration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest `max_tokens` a request may ask for
pub const MAX_TOKENS_LIMIT: u32 = 100_000;

/// Sampling parameters that affect the generated text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationParams {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Overrides the backend's configured model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_top_k() -> u32 {
    40
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_use_cache() -> bool {
    true
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_tokens: default_max_tokens(),
            model: None,
        }
    }
}

impl GenerationParams {
    pub fn validate(&self) -> Result<()> {
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(DispatchError::InvalidRequest(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }

        if !self.top_p.is_finite() || self.top_p <= 0.0 || self.top_p > 1.0 {
            return Err(DispatchError::InvalidRequest(format!(
                "top_p must be in (0, 1], got {}",
                self.top_p
            )));
        }

        if self.max_tokens == 0 || self.max_tokens > MAX_TOKENS_LIMIT {
            return Err(DispatchError::InvalidRequest(format!(
                "max_tokens must be between 1 and {}, got {}",
                MAX_TOKENS_LIMIT, self.max_tokens
            )));
        }

        if self.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(DispatchError::InvalidRequest(
                "model override cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// One text-generation request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Optional system instruction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default)]
    pub params: GenerationParams,
    /// Overall time budget for the request, including retries and fallbacks
    #[serde(
        default,
        with = "serde_duration::opt_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<Duration>,
    /// Read and write the response cache
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            params: GenerationParams::default(),
            deadline: None,
            use_cache: true,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.params.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.params.temperature = temperature;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.params.model = Some(model.into());
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Model to send to a backend configured with `default_model`
    pub fn model_or<'a>(&'a self, default_model: &'a str) -> &'a str {
        self.params.model.as_deref().unwrap_or(default_model)
    }

    /// Reject requests no backend should see
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(DispatchError::InvalidRequest(
                "prompt cannot be empty".to_string(),
            ));
        }

        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(DispatchError::InvalidRequest(
                "deadline must be greater than 0".to_string(),
            ));
        }

        self.params.validate()
    }
}
