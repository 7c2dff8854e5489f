//! Core configuration validators

use super::trait_def::Validate;
use crate::config::models::*;
use std::collections::HashSet;
use tracing::debug;

impl Validate for DispatcherConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating dispatcher configuration");

        if self.backends.is_empty() {
            return Err("At least one backend must be configured".to_string());
        }

        let mut names = HashSet::new();
        for backend in &self.backends {
            if !names.insert(backend.name.as_str()) {
                return Err(format!("Duplicate backend name: {}", backend.name));
            }
            backend.validate()?;
        }

        if self.enabled_backends().next().is_none() {
            return Err("At least one backend must be enabled".to_string());
        }

        self.cache.validate()?;
        self.rate_limit.validate()?;
        self.retry.validate()?;
        self.health.validate()?;

        if self.default_deadline.is_some_and(|d| d.is_zero()) {
            return Err("Default deadline must be greater than 0".to_string());
        }

        debug!("Dispatcher configuration validation completed");
        Ok(())
    }
}

impl Validate for CacheConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_entries == 0 {
            return Err("Cache max_entries must be greater than 0".to_string());
        }

        if self.max_bytes == 0 {
            return Err("Cache max_bytes must be greater than 0".to_string());
        }

        if self.default_ttl.is_zero() {
            return Err("Cache TTL must be greater than 0".to_string());
        }

        if self.sweep_every_puts == 0 {
            return Err("Cache sweep_every_puts must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for RateLimitConfig {
    fn validate(&self) -> Result<(), String> {
        if self.window.is_zero() {
            return Err("Rate limit window must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.base_delay > self.max_delay {
            return Err(format!(
                "Retry base_delay ({:?}) cannot exceed max_delay ({:?})",
                self.base_delay, self.max_delay
            ));
        }

        Ok(())
    }
}

impl Validate for HealthConfig {
    fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("Health failure_threshold must be at least 1".to_string());
        }

        Ok(())
    }
}
