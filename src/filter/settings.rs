//! Per-filter settings.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::resolver::RequestInfo;

/// Whether the constraint list is a whitelist or a blacklist.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Only addresses matching a constraint are permitted.
    Allow,

    /// Addresses matching any constraint are denied.
    #[default]
    Deny,
}

impl FilterMode {
    /// Mode name as used in configuration.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which decisions are written to the log sink.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Log granted and denied requests.
    #[default]
    All,

    /// Log granted requests only.
    Allow,

    /// Log denied requests only.
    Deny,
}

impl LogLevel {
    /// Whether "access granted" messages are emitted.
    #[must_use]
    pub fn logs_granted(&self) -> bool {
        !matches!(self, Self::Deny)
    }

    /// Whether "access denied" messages are emitted.
    #[must_use]
    pub fn logs_denied(&self) -> bool {
        !matches!(self, Self::Allow)
    }
}

/// Receives human-readable decision messages.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Replaces the built-in client address resolution.
pub type DetectIp = Arc<dyn Fn(&RequestInfo) -> String + Send + Sync>;

/// Log sink forwarding messages to `tracing` at info level.
#[must_use]
pub fn tracing_log_sink() -> LogSink {
    Arc::new(|message: &str| {
        tracing::info!(target: "r0n_ipfilter", "{message}");
    })
}

/// Immutable configuration of one filter instance.
#[derive(Clone)]
pub struct FilterSettings {
    /// Allow or deny mode.
    pub mode: FilterMode,

    /// Whether decisions are logged.
    pub log: bool,

    /// Destination of decision messages.
    pub log_sink: LogSink,

    /// Restricts which decisions are logged.
    pub log_level: LogLevel,

    /// Headers trusted to carry the client address, in priority order.
    ///
    /// Empty by default, so only the connection address is used. Unlike
    /// filters that trust `x-real-ip`, `cf-connecting-ip` and
    /// `x-forwarded-for` out of the box, these must be listed explicitly,
    /// and only when a proxy in front sets them.
    pub allowed_headers: Vec<String>,

    /// Permit private addresses unless a deny constraint names them.
    pub allow_private_ips: bool,

    /// URL patterns that bypass filtering.
    pub excluding: Vec<String>,

    /// Custom client address detection.
    pub detect_ip: Option<DetectIp>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            mode: FilterMode::Deny,
            log: true,
            log_sink: tracing_log_sink(),
            log_level: LogLevel::All,
            allowed_headers: Vec::new(),
            allow_private_ips: false,
            excluding: Vec::new(),
            detect_ip: None,
        }
    }
}

impl fmt::Debug for FilterSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSettings")
            .field("mode", &self.mode)
            .field("log", &self.log)
            .field("log_level", &self.log_level)
            .field("allowed_headers", &self.allowed_headers)
            .field("allow_private_ips", &self.allow_private_ips)
            .field("excluding", &self.excluding)
            .field("detect_ip", &self.detect_ip.is_some())
            .finish_non_exhaustive()
    }
}

impl FilterSettings {
    /// Create settings with defaults (deny mode, logging on).
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

    /// Enable or disable logging.
    #[must_use]
    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    /// Set the log sink.
    #[must_use]
    pub fn with_log_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.log_sink = Arc::new(sink);
        self
    }

    /// Restrict which decisions are logged.
    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Add a trusted header. Earlier headers take priority.
    #[must_use]
    pub fn with_allowed_header(mut self, header: impl Into<String>) -> Self {
        self.allowed_headers.push(header.into());
        self
    }

    /// Enable the private address exception.
    #[must_use]
    pub fn with_allow_private_ips(mut self, allow: bool) -> Self {
        self.allow_private_ips = allow;
        self
    }

    /// Add an exclusion pattern.
    #[must_use]
    pub fn with_excluding(mut self, pattern: impl Into<String>) -> Self {
        self.excluding.push(pattern.into());
        self
    }

    /// Replace address detection with a custom function.
    #[must_use]
    pub fn with_detect_ip<F>(mut self, detect: F) -> Self
    where
        F: Fn(&RequestInfo) -> String + Send + Sync + 'static,
    {
        self.detect_ip = Some(Arc::new(detect));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = FilterSettings::default();
        assert_eq!(settings.mode, FilterMode::Deny);
        assert!(settings.log);
        assert_eq!(settings.log_level, LogLevel::All);
        assert!(settings.allowed_headers.is_empty());
        assert!(!settings.allow_private_ips);
        assert!(settings.detect_ip.is_none());
    }

    #[test]
    fn test_settings_builder() {
        let settings = FilterSettings::new()
            .with_mode(FilterMode::Allow)
            .with_log(false)
            .with_log_level(LogLevel::Deny)
            .with_allowed_header("cf-connecting-ip")
            .with_allowed_header("x-forwarded-for")
            .with_allow_private_ips(true)
            .with_excluding("^/health")
            .with_detect_ip(|_| "10.0.0.1".to_string());

        assert_eq!(settings.mode, FilterMode::Allow);
        assert!(!settings.log);
        assert_eq!(
            settings.allowed_headers,
            vec!["cf-connecting-ip".to_string(), "x-forwarded-for".to_string()]
        );
        assert!(settings.allow_private_ips);
        assert_eq!(settings.excluding.len(), 1);
        assert!(settings.detect_ip.is_some());

        let debug = format!("{settings:?}");
        assert!(debug.contains("detect_ip: true"));
    }

    #[test]
    fn test_log_level() {
        assert!(LogLevel::All.logs_granted());
        assert!(LogLevel::All.logs_denied());
        assert!(LogLevel::Allow.logs_granted());
        assert!(!LogLevel::Allow.logs_denied());
        assert!(!LogLevel::Deny.logs_granted());
        assert!(LogLevel::Deny.logs_denied());
    }

    #[test]
    fn test_mode_serde() {
        let mode: FilterMode = serde_json::from_str("\"allow\"").unwrap();
        assert_eq!(mode, FilterMode::Allow);
        assert_eq!(FilterMode::Deny.to_string(), "deny");

        let level: LogLevel = serde_json::from_str("\"deny\"").unwrap();
        assert_eq!(level, LogLevel::Deny);
    }
}
