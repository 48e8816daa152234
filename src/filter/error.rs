//! Error types for IP filtering.

use thiserror::Error;

/// Result type for IP filter construction.
pub type IpFilterResult<T> = Result<T, IpFilterError>;

/// Errors raised while building an IP filter.
///
/// Evaluation itself never fails: a rejected address is reported through
/// [`Decision::Deny`](super::Decision::Deny), not through this type.
#[derive(Debug, Error)]
pub enum IpFilterError {
    /// A constraint that is neither an address, a CIDR block nor a range.
    #[error("invalid constraint '{0}'")]
    InvalidConstraint(String),

    /// CIDR notation that failed to parse.
    #[error("invalid CIDR notation '{value}': {source}")]
    InvalidCidr {
        /// The offending text.
        value: String,
        /// Underlying parse error.
        #[source]
        source: ipnet::AddrParseError,
    },

    /// An address range with bad bounds.
    #[error("invalid address range: {0}")]
    InvalidRange(String),

    /// An exclusion pattern that is not a valid regular expression.
    #[error("invalid exclusion pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },
}

impl IpFilterError {
    /// Check if this error comes from the constraint list.
    #[must_use]
    pub fn is_constraint_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConstraint(_) | Self::InvalidCidr { .. } | Self::InvalidRange(_)
        )
    }
}
