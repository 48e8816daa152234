//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::filter::IpFilterError;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read configuration file '{path}': {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML content.
    #[error("failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration validation failed.
    #[error("configuration validation failed: {0}")]
    ValidationError(String),

    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),

    /// The configuration could not be turned into a filter.
    #[error("failed to build IP filter: {0}")]
    Filter(#[from] IpFilterError),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
