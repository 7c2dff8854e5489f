//! Shared utilities for the HTTP adapters
//!
//! Status and transport classification lives here so every adapter maps
//! failures the same way.

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::RequestBuilder;
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use crate::core::providers::unified_provider::ProviderError;

/// Largest retry hint honoured from a response
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Extract a human-readable message from a provider error body
pub fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let message = json
            .get("error")
            .and_then(|e| e.get("message").or(Some(e)))
            .and_then(|m| m.as_str())
            .or_else(|| json.get("message").and_then(|m| m.as_str()));
        if let Some(message) = message {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed.chars().take(512).collect()
    }
}

fn error_code(body: &str) -> Option<String> {
    let json = serde_json::from_str::<Value>(body).ok()?;
    let error = json.get("error")?;
    error
        .get("code")
        .or_else(|| error.get("type"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
}

fn mentions_context_length(code: Option<&str>, message: &str) -> bool {
    if code == Some("context_length_exceeded") {
        return true;
    }
    let lower = message.to_ascii_lowercase();
    lower.contains("context length")
        || lower.contains("context window")
        || lower.contains("maximum context")
}

/// Parse a `Retry-After` header given in seconds
pub fn retry_after_from_headers(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    let secs = value.trim().parse::<f64>().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(secs).min(MAX_RETRY_AFTER))
}

fn retry_after_from_body(body: &str) -> Option<Duration> {
    let json = serde_json::from_str::<Value>(body).ok()?;
    let secs = json
        .get("retry_after")
        .or_else(|| json.get("error").and_then(|e| e.get("retry_after")))
        .and_then(|r| r.as_f64())?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(secs).min(MAX_RETRY_AFTER))
}

/// Map a non-success HTTP status and body to a classified error
pub fn map_http_error(
    backend: &str,
    model: &str,
    status: u16,
    headers: &HeaderMap,
    body: &str,
) -> ProviderError {
    let message = error_message(body);
    let code = error_code(body);

    match status {
        400 | 422 => {
            if mentions_context_length(code.as_deref(), &message) {
                ProviderError::context_length_exceeded(backend, message)
            } else {
                ProviderError::invalid_request(backend, message)
            }
        }
        401 | 403 => ProviderError::authentication(backend, message),
        402 => ProviderError::quota_exceeded(backend, message),
        404 => ProviderError::model_not_found(backend, model),
        408 => ProviderError::timeout(backend, message),
        413 => ProviderError::context_length_exceeded(backend, message),
        429 => {
            if code.as_deref() == Some("insufficient_quota") {
                return ProviderError::quota_exceeded(backend, message);
            }
            let retry_after =
                retry_after_from_headers(headers).or_else(|| retry_after_from_body(body));
            ProviderError::rate_limit_with_message(backend, message, retry_after)
        }
        502..=504 | 529 => ProviderError::provider_unavailable(
            backend,
            format!("Service error {}: {}", status, message),
        ),
        _ => ProviderError::api_error(backend, status, message),
    }
}

/// Map a transport-level failure to a classified error
pub fn map_transport_error(backend: &str, err: &reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(backend, err.to_string())
    } else {
        ProviderError::network(backend, err.to_string())
    }
}

/// Join a base URL and an endpoint path without doubling slashes
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Send a JSON POST and return the parsed success body
pub async fn post_json(
    request: RequestBuilder,
    request_timeout: Duration,
    backend: &str,
    model: &str,
) -> Result<Value, ProviderError> {
    let response = timeout(request_timeout, request.send())
        .await
        .map_err(|_| {
            ProviderError::timeout(
                backend,
                format!("no response within {:.1}s", request_timeout.as_secs_f64()),
            )
        })?
        .map_err(|e| map_transport_error(backend, &e))?;

    let status = response.status();
    let headers = response.headers().clone();
    let text = response
        .text()
        .await
        .map_err(|e| map_transport_error(backend, &e))?;

    if !status.is_success() {
        debug!(backend, status = status.as_u16(), "backend returned error status");
        return Err(map_http_error(backend, model, status.as_u16(), &headers, &text));
    }

    serde_json::from_str(&text)
        .map_err(|e| ProviderError::response_parsing(backend, format!("Failed to parse JSON: {}", e)))
}
