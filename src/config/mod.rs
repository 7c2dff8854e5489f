//! Configuration management for the dispatcher
//!
//! This module handles loading and validation of the dispatcher configuration.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{DispatchError, Result};
use std::path::Path;
use tracing::{debug, info};

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "LLM_DISPATCH_CONFIG";

/// Serialization format of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Pick a format from the file extension; anything but `.json` is YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

impl DispatcherConfig {
    /// Load configuration from file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DispatchError::Config(format!("Failed to read config file: {}", e)))?;

        let config = Self::parse(&content, ConfigFormat::from_path(path))?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from the file named by `LLM_DISPATCH_CONFIG`
    pub async fn from_env() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV_VAR).map_err(|_| {
            DispatchError::Config(format!("{} is not set", CONFIG_ENV_VAR))
        })?;
        Self::from_file(path).await
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config: Self = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| DispatchError::Config(format!("Failed to parse config: {}", e)))?,
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| DispatchError::Config(format!("Failed to parse config: {}", e)))?,
        };

        config.validate_all()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate_all(&self) -> Result<()> {
        Validate::validate(self).map_err(DispatchError::Config)
    }
}
