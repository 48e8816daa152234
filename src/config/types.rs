//! Configuration types for the IP filter file format.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::filter::{
    Constraint, FilterMode, FilterSettings, IpFilter, IpFilterResult, LogLevel, StaticPolicy,
};

/// IP filter configuration as read from TOML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterConfig {
    /// Allow or deny mode.
    #[serde(default)]
    pub mode: FilterMode,

    /// Whether decisions are logged.
    #[serde(default = "default_log")]
    pub log: bool,

    /// Which decisions are logged.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Permit private addresses unless explicitly denied.
    #[serde(default)]
    pub allow_private_ips: bool,

    /// Headers trusted to carry the client address, in priority order.
    #[serde(default)]
    pub allowed_headers: Vec<String>,

    /// URL patterns that bypass filtering.
    #[serde(default)]
    pub excluding: Vec<String>,

    /// Addresses, CIDR blocks and ranges.
    #[serde(default)]
    pub addresses: Vec<ConstraintEntry>,
}

fn default_log() -> bool {
    true
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            mode: FilterMode::Deny,
            log: true,
            log_level: LogLevel::All,
            allow_private_ips: false,
            allowed_headers: Vec::new(),
            excluding: Vec::new(),
            addresses: Vec::new(),
        }
    }
}

/// One entry of the `addresses` list.
///
/// A string is an address or CIDR block; an array of one or two strings is a
/// range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ConstraintEntry {
    /// Address or CIDR block.
    Single(String),

    /// Range bounds.
    Range(Vec<String>),
}

impl ConstraintEntry {
    /// Parse into a constraint.
    pub fn to_constraint(&self) -> IpFilterResult<Constraint> {
        match self {
            Self::Single(value) => Constraint::parse(value),
            Self::Range(bounds) => Constraint::range(bounds.as_slice()),
        }
    }
}

impl From<&str> for ConstraintEntry {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl FilterConfig {
    /// Create a config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mode.
    #[must_use]
    pub fn with_mode(mut self, mode: FilterMode) -> Self {
        self.mode = mode;
        self
    }

    /// Add an address entry.
    #[must_use]
    pub fn with_address(mut self, entry: impl Into<ConstraintEntry>) -> Self {
        self.addresses.push(entry.into());
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        for (i, entry) in self.addresses.iter().enumerate() {
            entry
                .to_constraint()
                .map_err(|e| format!("addresses[{i}]: {e}"))?;
        }

        for (i, pattern) in self.excluding.iter().enumerate() {
            Regex::new(pattern).map_err(|e| format!("excluding[{i}]: {e}"))?;
        }

        for (i, header) in self.allowed_headers.iter().enumerate() {
            if header.trim().is_empty() {
                return Err(format!("allowed_headers[{i}]: header name cannot be empty"));
            }
        }

        Ok(())
    }

    /// Parse the address list.
    pub fn constraints(&self) -> IpFilterResult<Vec<Constraint>> {
        self.addresses
            .iter()
            .map(ConstraintEntry::to_constraint)
            .collect()
    }

    /// Filter settings described by this config, logging through `tracing`.
    #[must_use]
    pub fn settings(&self) -> FilterSettings {
        FilterSettings {
            mode: self.mode,
            log: self.log,
            log_level: self.log_level,
            allow_private_ips: self.allow_private_ips,
            allowed_headers: self.allowed_headers.clone(),
            excluding: self.excluding.clone(),
            ..FilterSettings::default()
        }
    }

    /// Build a filter with a static policy.
    pub fn build(&self) -> IpFilterResult<IpFilter> {
        IpFilter::new(StaticPolicy::new(self.constraints()?), self.settings())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FilterConfig::default();
        assert_eq!(config.mode, FilterMode::Deny);
        assert!(config.log);
        assert_eq!(config.log_level, LogLevel::All);
        assert!(config.addresses.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_mixed_addresses() {
        let config: FilterConfig = toml::from_str(
            r#"
            mode = "allow"
            addresses = ["127.0.0.1", "10.0.0.0/8", ["192.168.1.10", "192.168.1.20"], ["::1"]]
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, FilterMode::Allow);
        assert_eq!(config.addresses.len(), 4);
        assert_eq!(
            config.addresses[2],
            ConstraintEntry::Range(vec!["192.168.1.10".to_string(), "192.168.1.20".to_string()])
        );

        let constraints = config.constraints().unwrap();
        assert_eq!(constraints[0].kind(), "explicit");
        assert_eq!(constraints[1].kind(), "cidr");
        assert_eq!(constraints[2].kind(), "range");
        assert_eq!(constraints[3].kind(), "range");
    }

    #[test]
    fn test_validation_errors() {
        let config = FilterConfig::new().with_address("not-an-ip");
        let err = config.validate().unwrap_err();
        assert!(err.starts_with("addresses[0]:"));

        let config = FilterConfig {
            excluding: vec!["(".to_string()],
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().starts_with("excluding[0]:"));

        let config = FilterConfig {
            allowed_headers: vec![" ".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_settings_from_config() {
        let config = FilterConfig {
            mode: FilterMode::Allow,
            log: false,
            log_level: LogLevel::Deny,
            allow_private_ips: true,
            allowed_headers: vec!["x-real-ip".to_string()],
            excluding: vec!["^/health".to_string()],
            addresses: Vec::new(),
        };

        let settings = config.settings();
        assert_eq!(settings.mode, FilterMode::Allow);
        assert!(!settings.log);
        assert_eq!(settings.log_level, LogLevel::Deny);
        assert!(settings.allow_private_ips);
        assert_eq!(settings.allowed_headers, vec!["x-real-ip".to_string()]);
        assert!(settings.detect_ip.is_none());
    }

    #[test]
    fn test_build() {
        let config = FilterConfig::new()
            .with_mode(FilterMode::Allow)
            .with_address("10.0.0.0/8");
        let filter = config.build().unwrap();
        assert!(filter.is_permitted("10.9.8.7"));
        assert!(!filter.is_permitted("11.0.0.1"));
    }
}
