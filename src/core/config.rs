//! Runtime configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default cap on owner-chain hops walked during transfer checks
pub const DEFAULT_MAX_NESTING_DEPTH: u32 = 8;

/// Object runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum number of owner pointers followed by an ancestry walk.
    /// Deeper (or cyclic) chains abort with `MaximumNesting`.
    pub max_nesting_depth: u32,
    /// Log every ownership change at info level
    pub log_transfers: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            log_transfers: true,
        }
    }
}

impl RuntimeConfig {
    pub fn with_max_nesting_depth(mut self, depth: u32) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nesting_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_nesting_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load a JSON config file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
