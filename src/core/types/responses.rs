//! Completion response types

use serde::{Deserialize, Serialize};

/// Result of a successful `Dispatcher::complete` call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionResponse {
    /// Generated text
    pub text: String,
    /// Backend that produced the text; `None` when served from cache
    pub backend_used: Option<String>,
    /// Served from the response cache
    pub cached: bool,
    /// Backend attempts made for this request, across all backends
    pub attempts: u32,
}

impl CompletionResponse {
    pub fn from_cache(text: String) -> Self {
        Self {
            text,
            backend_used: None,
            cached: true,
            attempts: 0,
        }
    }
}
