//! # Config Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Config Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │      File       │  │     Format      │  │      Content            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Io             │  │  LoadFailed     │  │  InvalidConfig          │ │
//! │  │  NoConfigPath   │  │  SaveFailed     │  │  Tax / Validation       │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use product_taxes_core::{TaxError, ValidationError};
use thiserror::Error;

/// Result type alias for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings parsed but make no sense.
    #[error("Invalid product tax configuration: {0}")]
    InvalidConfig(String),

    /// Settings file could not be parsed.
    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    /// Settings could not be serialized.
    #[error("Failed to save config: {0}")]
    SaveFailed(String),

    /// No explicit path and no platform config directory.
    #[error("No config path available")]
    NoConfigPath,

    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Submitted rate rows were rejected.
    #[error(transparent)]
    Tax(#[from] TaxError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SaveFailed(err.to_string())
    }
}
