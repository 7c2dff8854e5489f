//! Backend configuration validators

use super::trait_def::Validate;
use crate::config::models::*;
use std::time::Duration;
use url::Url;

const MAX_BACKEND_TIMEOUT: Duration = Duration::from_secs(10_000);
const MAX_RETRIES: u32 = 10;

impl Validate for BackendConfig {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Backend name cannot be empty".to_string());
        }

        let url = Url::parse(&self.base_url)
            .map_err(|e| format!("Backend {}: invalid base_url '{}': {}", self.name, self.base_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "Backend {}: base_url must start with http:// or https://",
                self.name
            ));
        }

        if self.model.trim().is_empty() {
            return Err(format!("Backend {}: model cannot be empty", self.name));
        }

        if self.kind.requires_api_key() && self.resolved_api_key().is_none() {
            return Err(match &self.api_key_env {
                Some(var) => format!(
                    "Backend {}: api_key is empty and environment variable {} is not set",
                    self.name, var
                ),
                None => format!("Backend {}: api_key is required for {}", self.name, self.kind),
            });
        }

        if self.timeout.is_zero() || self.timeout > MAX_BACKEND_TIMEOUT {
            return Err(format!(
                "Backend {}: timeout must be between 0 and {} seconds",
                self.name,
                MAX_BACKEND_TIMEOUT.as_secs()
            ));
        }

        if self.max_retries > MAX_RETRIES {
            return Err(format!(
                "Backend {}: max_retries cannot exceed {}",
                self.name, MAX_RETRIES
            ));
        }

        if self.weight == 0 {
            return Err(format!("Backend {}: weight must be at least 1", self.name));
        }

        Ok(())
    }
}
