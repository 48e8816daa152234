//! Policy evaluation under allow/deny mode.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::constraint::Constraint;
use super::settings::FilterMode;

/// Evaluates a resolved address against a constraint list.
#[derive(Debug, Clone, Copy)]
pub struct PolicyMatcher {
    mode: FilterMode,
    allow_private_ips: bool,
}

impl PolicyMatcher {
    /// Create a matcher.
    #[must_use]
    pub fn new(mode: FilterMode, allow_private_ips: bool) -> Self {
        Self {
            mode,
            allow_private_ips,
        }
    }

    /// The configured mode.
    #[must_use]
    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Decide whether an address is permitted.
    ///
    /// Allow mode permits when any constraint matches; deny mode permits when
    /// none does. With the private exception enabled, private addresses are
    /// permitted as well, except when a deny constraint names them.
    #[must_use]
    pub fn evaluate(&self, addr: IpAddr, constraints: &[Constraint]) -> bool {
        let matched = constraints.iter().any(|c| c.matches(addr));

        let permitted = match self.mode {
            FilterMode::Allow => matched,
            FilterMode::Deny => !matched,
        };

        if permitted {
            return true;
        }

        let explicitly_denied = self.mode == FilterMode::Deny && matched;
        self.allow_private_ips && is_private(addr) && !explicitly_denied
    }
}

/// Check if an address lies in a private or otherwise non-routable range.
#[must_use]
pub fn is_private(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_private_v4(v4),
            None => is_private_v6(v6),
        },
    }
}

fn is_private_v4(addr: Ipv4Addr) -> bool {
    addr.is_private() || addr.is_loopback() || addr.is_link_local() || addr.is_unspecified()
}

fn is_private_v6(addr: Ipv6Addr) -> bool {
    let first = addr.segments()[0];
    addr.is_loopback()
        || addr.is_unspecified()
        // fc00::/7
        || (first & 0xfe00) == 0xfc00
        // fe80::/10
        || (first & 0xffc0) == 0xfe80
}
