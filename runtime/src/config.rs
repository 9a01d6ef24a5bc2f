//! Configuration for the managed transaction context.
//!
//! # Example
//!
//! ```no_run
//! use tx_listeners_runtime::config::ContextConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Reads TX_LISTENERS_MANAGER_NAME and TX_LISTENERS_METRICS
//! let config = ContextConfig::from_env()?;
//!
//! println!("Manager: {}", config.manager_name);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the transaction manager.
pub const MANAGER_NAME_VAR: &str = "TX_LISTENERS_MANAGER_NAME";

/// Environment variable toggling metric recording.
pub const METRICS_VAR: &str = "TX_LISTENERS_METRICS";

/// Configuration error
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid value in an environment variable
    #[error("Invalid value for {var}: {value}")]
    InvalidValue {
        /// The variable that was read
        var: &'static str,
        /// The rejected value
        value: String,
    },
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Settings for a [`ManagedTransactionContext`](crate::ManagedTransactionContext).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Name of the external transaction manager, attached to log records.
    pub manager_name: String,
    /// Whether listener and manager-interaction metrics are recorded.
    pub metrics_enabled: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            manager_name: "default".to_string(),
            metrics_enabled: true,
        }
    }
}

impl ContextConfig {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds an unparseable value or the result
    /// fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup(MANAGER_NAME_VAR) {
            config.manager_name = name;
        }
        if let Some(value) = lookup(METRICS_VAR) {
            config.metrics_enabled = parse_flag(METRICS_VAR, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the manager name.
    #[must_use]
    pub fn with_manager_name(mut self, name: impl Into<String>) -> Self {
        self.manager_name = name.into();
        self
    }

    /// Enable or disable metric recording.
    #[must_use]
    pub const fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if the manager name is empty or contains characters
    /// outside `[A-Za-z0-9_.-]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.manager_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "manager_name must not be empty".to_string(),
            ));
        }
        if let Some(c) = self
            .manager_name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
        {
            return Err(ConfigError::ValidationError(format!(
                "manager_name contains invalid character {c:?}"
            )));
        }
        Ok(())
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}
