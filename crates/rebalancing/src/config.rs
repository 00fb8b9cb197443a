//! Redirecting layer configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings of the redirecting layer. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Initial value of the redirection toggle.
    pub redirecting_enabled: bool,
    /// Initial value of the proxy-put toggle.
    pub proxy_put_enabled: bool,
    /// Worker threads executing asynchronous proxy puts.
    pub proxy_put_threads: usize,
    /// Queued proxy puts beyond which submissions are rejected.
    pub proxy_put_queue_capacity: usize,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            redirecting_enabled: true,
            proxy_put_enabled: true,
            proxy_put_threads: 8,
            proxy_put_queue_capacity: 1024,
        }
    }
}

impl RedirectConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RedirectConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.proxy_put_threads == 0 {
            return Err(ConfigError::Invalid("proxy_put_threads must be positive".into()));
        }
        if self.proxy_put_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "proxy_put_queue_capacity must be positive".into(),
            ));
        }
        Ok(())
    }
}
