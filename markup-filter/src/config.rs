//! Configuration module for the markup filter
//!
//! Only plain options live here. The output sink and the scraper and
//! transformer hooks are handed to [`MarkupFilter`](crate::MarkupFilter)
//! directly since they are borrowed, not described.

use serde::Deserialize;
use thiserror::Error;

use crate::MAX_BUFFER_SIZE;

/// How byte input is turned into characters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodePolicy {
    /// Replace invalid sequences with U+FFFD
    #[default]
    Lossy,
    /// Reject invalid sequences with an error
    Strict,
}

/// Construction options for a filter instance
#[derive(Clone, Debug, Deserialize)]
pub struct FilterConfig {
    /// Stop filtering and copy input verbatim once binary content is seen
    #[serde(default)]
    pub pass_by_if_binary_suspect: bool,

    /// Initial capacity hint for the pending-unit buffer
    #[serde(default = "default_initial_buffer_size")]
    pub initial_buffer_size: usize,

    /// Ceiling for every buffer of the instance, in characters
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,

    /// Decoding policy for byte input
    #[serde(default)]
    pub decode_policy: DecodePolicy,

    /// Whether to emit structured filter events through `log`
    #[serde(default = "default_log_events")]
    pub log_events: bool,
}

fn default_initial_buffer_size() -> usize {
    64
}

fn default_max_buffer_size() -> usize {
    MAX_BUFFER_SIZE
}

fn default_log_events() -> bool {
    true
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            pass_by_if_binary_suspect: false,
            initial_buffer_size: default_initial_buffer_size(),
            max_buffer_size: default_max_buffer_size(),
            decode_policy: DecodePolicy::default(),
            log_events: default_log_events(),
        }
    }
}

impl FilterConfig {
    /// Parse configuration from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config_str = std::str::from_utf8(bytes)
            .map_err(|e| ConfigError::InvalidUtf8(e.to_string()))?;

        let config: FilterConfig = serde_json::from_str(config_str)
            .map_err(|e| ConfigError::InvalidJson(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Builder-style toggle for pass-by on binary suspicion
    pub fn with_pass_by(mut self, enabled: bool) -> Self {
        self.pass_by_if_binary_suspect = enabled;
        self
    }

    /// Builder-style buffer ceiling
    pub fn with_max_buffer_size(mut self, max: usize) -> Self {
        self.max_buffer_size = max;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_buffer_size == 0 {
            return Err(ConfigError::InvalidValue(
                "max_buffer_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration parsing errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(String),
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
