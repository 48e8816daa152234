//! Client address resolution from connection info and proxy headers.

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use super::settings::DetectIp;

/// The parts of a request the filter looks at.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    /// Address of the directly connected peer.
    pub remote_addr: String,
    /// Request URL (path and query).
    pub url: String,
    /// Request headers. Names compare case-insensitively.
    pub headers: HashMap<String, String>,
}

impl RequestInfo {
    /// Create an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the remote address.
    #[must_use]
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = addr.into();
        self
    }

    /// Set the URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Add a header. Names are case-insensitive.
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Look up a header by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.headers.get(&name.to_ascii_lowercase()) {
            return Some(value.as_str());
        }

        // Keys inserted directly into `headers` may keep their original case.
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Extracts the client address from a request.
#[derive(Clone, Default)]
pub struct AddressResolver {
    allowed_headers: Vec<String>,
    detect_ip: Option<DetectIp>,
}

impl fmt::Debug for AddressResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressResolver")
            .field("allowed_headers", &self.allowed_headers)
            .field("detect_ip", &self.detect_ip.is_some())
            .finish()
    }
}

impl AddressResolver {
    /// Create a resolver trusting the given headers, in priority order.
    #[must_use]
    pub fn new(allowed_headers: &[String], detect_ip: Option<DetectIp>) -> Self {
        Self {
            allowed_headers: allowed_headers
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .collect(),
            detect_ip,
        }
    }

    /// Resolve the client address, or an empty string if none is found.
    ///
    /// A custom detection function, when configured, is returned verbatim.
    #[must_use]
    pub fn resolve(&self, request: &RequestInfo) -> String {
        if let Some(ref detect) = self.detect_ip {
            return detect(request);
        }

        let address = self
            .from_headers(request)
            .unwrap_or_else(|| request.remote_addr.trim());

        if address.is_empty() {
            return String::new();
        }

        normalize_address(address)
    }

    /// First trusted header with a usable value.
    fn from_headers<'a>(&self, request: &'a RequestInfo) -> Option<&'a str> {
        self.allowed_headers.iter().find_map(|name| {
            let value = request.header(name)?;
            // Leftmost entry is the original client.
            let first = value.split(',').next()?.trim();
            (!first.is_empty()).then_some(first)
        })
    }
}

/// Reduce an address to the form used for matching.
///
/// IPv4-mapped IPv6 literals lose their `::ffff:` marker, IPv4 addresses
/// lose a trailing `:port`, and bracketed IPv6 loses brackets and port.
/// Plain IPv6 literals are returned unchanged.
#[must_use]
pub fn normalize_address(address: &str) -> String {
    let address = address.trim();

    if let Some(rest) = address.strip_prefix('[') {
        if let Some((inner, _)) = rest.split_once(']') {
            return normalize_address(inner);
        }
    }

    if let Some(v4) = strip_mapped_prefix(address) {
        return v4.to_string();
    }

    if let Some((host, port)) = address.rsplit_once(':') {
        if host.parse::<Ipv4Addr>().is_ok() && port.bytes().all(|b| b.is_ascii_digit()) {
            return host.to_string();
        }
    }

    address.to_string()
}

fn strip_mapped_prefix(address: &str) -> Option<&str> {
    let prefix = address.get(..7)?;
    if !prefix.eq_ignore_ascii_case("::ffff:") {
        return None;
    }

    let rest = &address[7..];
    rest.parse::<Ipv4Addr>().is_ok().then_some(rest)
}

/// Parse a resolved address for matching, folding mapped IPv6 into IPv4.
#[must_use]
pub fn parse_resolved(address: &str) -> Option<IpAddr> {
    address
        .parse::<IpAddr>()
        .ok()
        .map(|addr| addr.to_canonical())
}
