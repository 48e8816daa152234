//! Filter decisions and the denial signal.

use http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

/// Denial handed to the caller when a request is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct IpDenied {
    message: String,
    address: String,
    extra: Value,
}

impl IpDenied {
    /// Name carried in serialized denials.
    pub const NAME: &'static str = "IpDenied";

    /// Create a denial for an address.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            message: format!("Access denied to IP address: {address}"),
            extra: json!({ "ip": address }),
            address,
        }
    }

    /// Replace the extra payload.
    #[must_use]
    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = extra;
        self
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The rejected address. Empty when none could be resolved.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Extra payload.
    #[must_use]
    pub fn extra(&self) -> &Value {
        &self.extra
    }

    /// HTTP status the caller should answer with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::FORBIDDEN
    }

    /// JSON form: `{name, message, extra, status, statusCode}`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let status = self.status().as_u16();
        json!({
            "name": Self::NAME,
            "message": self.message,
            "extra": self.extra,
            "status": status,
            "statusCode": status,
        })
    }
}

/// Outcome of evaluating one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The request may proceed.
    Permit {
        /// The resolved address.
        address: String,
    },

    /// The request path matched an exclusion pattern; no address was checked.
    Excluded {
        /// The first matching pattern.
        pattern: String,
    },

    /// The request is rejected.
    Deny(IpDenied),
}

impl Decision {
    /// Create a permit decision.
    #[must_use]
    pub fn permit(address: impl Into<String>) -> Self {
        Self::Permit {
            address: address.into(),
        }
    }

    /// Create a deny decision.
    #[must_use]
    pub fn deny(address: impl Into<String>) -> Self {
        Self::Deny(IpDenied::new(address))
    }

    /// Whether the request is permitted.
    #[must_use]
    pub fn is_permitted(&self) -> bool {
        matches!(self, Self::Permit { .. } | Self::Excluded { .. })
    }

    /// Whether the request is denied.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny(_))
    }

    /// Convert into a result for `?`-style propagation.
    pub fn into_result(self) -> Result<(), IpDenied> {
        match self {
            Self::Permit { .. } | Self::Excluded { .. } => Ok(()),
            Self::Deny(denied) => Err(denied),
        }
    }
}
