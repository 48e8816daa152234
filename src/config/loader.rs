//! Configuration file loader.

use super::error::{ConfigError, ConfigResult};
use super::types::FilterConfig;
use crate::filter::IpFilter;
use std::path::Path;
use tracing::debug;

/// Loads and validates IP filter configuration files.
#[derive(Debug, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The TOML is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(&self, path: P) -> ConfigResult<FilterConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        debug!(path = %path.display(), "loading IP filter configuration");
        self.load_str(&content)
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    pub fn load_str(&self, content: &str) -> ConfigResult<FilterConfig> {
        let config: FilterConfig = toml::from_str(content)?;
        config.validate().map_err(ConfigError::ValidationError)?;
        Ok(config)
    }

    /// Load a configuration file and build a filter from it.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the filter cannot be built.
    pub fn load_filter<P: AsRef<Path>>(&self, path: P) -> ConfigResult<IpFilter> {
        let config = self.load(path)?;
        Ok(config.build()?)
    }
}
