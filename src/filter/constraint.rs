//! Address constraints: explicit addresses, CIDR blocks and ranges.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnet::{IpNet, Ipv4Net};

use super::error::{IpFilterError, IpFilterResult};

/// One configured address-matching rule.
///
/// The shape is decided once when the policy is loaded; matching never
/// re-inspects the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// A single address.
    Explicit(IpAddr),

    /// A network block in CIDR notation.
    Cidr(IpNet),

    /// An inclusive address range.
    Range(AddressRange),
}

/// An inclusive range of addresses within one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    start: IpAddr,
    end: IpAddr,
}

impl AddressRange {
    /// Create a range from its bounds.
    ///
    /// Both bounds must belong to the same address family and `start` must
    /// not be greater than `end`.
    pub fn new(start: IpAddr, end: IpAddr) -> IpFilterResult<Self> {
        let (start, end) = (start.to_canonical(), end.to_canonical());

        if start.is_ipv4() != end.is_ipv4() {
            return Err(IpFilterError::InvalidRange(format!(
                "bounds {start} and {end} belong to different address families"
            )));
        }

        if ordinal(start) > ordinal(end) {
            return Err(IpFilterError::InvalidRange(format!(
                "start {start} is greater than end {end}"
            )));
        }

        Ok(Self { start, end })
    }

    /// Create a degenerate range holding one address.
    #[must_use]
    pub fn single(addr: IpAddr) -> Self {
        let addr = addr.to_canonical();
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Lower bound.
    #[must_use]
    pub fn start(&self) -> IpAddr {
        self.start
    }

    /// Upper bound.
    #[must_use]
    pub fn end(&self) -> IpAddr {
        self.end
    }

    /// Whether this range holds exactly one address.
    #[must_use]
    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// Check if an address falls within the range, bounds included.
    #[must_use]
    pub fn contains(&self, addr: IpAddr) -> bool {
        if self.is_single() {
            return addr == self.start;
        }

        if addr.is_ipv4() != self.start.is_ipv4() {
            return false;
        }

        let value = ordinal(addr);
        value >= ordinal(self.start) && value <= ordinal(self.end)
    }
}

/// Unsigned ordinal of an address within its family.
fn ordinal(addr: IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u128::from(u32::from(v4)),
        IpAddr::V6(v6) => u128::from(v6),
    }
}

/// Fold an IPv6 block inside `::ffff:0:0/96` into the IPv4 block it maps,
/// so it compares against canonical addresses.
fn canonical_net(net: IpNet) -> IpNet {
    let IpNet::V6(v6) = net else {
        return net;
    };

    match v6.addr().to_ipv4_mapped() {
        Some(v4) if v6.prefix_len() >= 96 => Ipv4Net::new(v4, v6.prefix_len() - 96)
            .map(IpNet::V4)
            .unwrap_or(net),
        _ => net,
    }
}

impl Constraint {
    /// Parse a textual constraint: a CIDR block if it contains `/`,
    /// otherwise a single address.
    pub fn parse(value: &str) -> IpFilterResult<Self> {
        let value = value.trim();

        if value.contains('/') {
            let net: IpNet = value.parse().map_err(|e| IpFilterError::InvalidCidr {
                value: value.to_string(),
                source: e,
            })?;
            return Ok(Self::Cidr(canonical_net(net)));
        }

        value
            .parse::<IpAddr>()
            .map(|addr| Self::Explicit(addr.to_canonical()))
            .map_err(|_| IpFilterError::InvalidConstraint(value.to_string()))
    }

    /// Build a range constraint from one or two textual bounds.
    ///
    /// One bound yields a singleton range.
    pub fn range<S: AsRef<str>>(bounds: &[S]) -> IpFilterResult<Self> {
        let parse_bound = |s: &S| {
            let s = s.as_ref().trim();
            s.parse::<IpAddr>()
                .map_err(|_| IpFilterError::InvalidRange(format!("invalid bound '{s}'")))
        };

        match bounds {
            [single] => Ok(Self::Range(AddressRange::single(parse_bound(single)?))),
            [start, end] => Ok(Self::Range(AddressRange::new(
                parse_bound(start)?,
                parse_bound(end)?,
            )?)),
            _ => Err(IpFilterError::InvalidRange(format!(
                "expected 1 or 2 bounds, got {}",
                bounds.len()
            ))),
        }
    }

    /// Check if this constraint matches a resolved address.
    #[must_use]
    pub fn matches(&self, addr: IpAddr) -> bool {
        match self {
            Self::Explicit(expected) => *expected == addr,
            Self::Cidr(net) => net.contains(&addr),
            Self::Range(range) => range.contains(addr),
        }
    }

    /// Short name of the constraint kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Explicit(_) => "explicit",
            Self::Cidr(_) => "cidr",
            Self::Range(_) => "range",
        }
    }
}

impl FromStr for Constraint {
    type Err = IpFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<IpAddr> for Constraint {
    fn from(addr: IpAddr) -> Self {
        Self::Explicit(addr.to_canonical())
    }
}

impl From<IpNet> for Constraint {
    fn from(net: IpNet) -> Self {
        Self::Cidr(canonical_net(net))
    }
}

impl From<AddressRange> for Constraint {
    fn from(range: AddressRange) -> Self {
        Self::Range(range)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(addr) => write!(f, "{addr}"),
            Self::Cidr(net) => write!(f, "{net}"),
            Self::Range(range) if range.is_single() => write!(f, "[{}]", range.start),
            Self::Range(range) => write!(f, "[{}, {}]", range.start, range.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_explicit() {
        let c = Constraint::parse("127.0.0.1").unwrap();
        assert_eq!(c, Constraint::Explicit(ip("127.0.0.1")));
        assert_eq!(c.kind(), "explicit");

        let c = Constraint::parse("2001:4860:8006::62").unwrap();
        assert!(c.matches(ip("2001:4860:8006:0::62")));
    }

    #[test]
    fn test_parse_mapped_explicit_is_canonical() {
        let c = Constraint::parse("::ffff:127.0.0.1").unwrap();
        assert_eq!(c, Constraint::Explicit(ip("127.0.0.1")));
    }

    #[test]
    fn test_parse_mapped_cidr_is_canonical() {
        let c = Constraint::parse("::ffff:10.0.0.0/104").unwrap();
        assert_eq!(c, Constraint::parse("10.0.0.0/8").unwrap());
        assert!(c.matches(ip("10.0.0.1")));
        assert!(!c.matches(ip("11.0.0.1")));

        let c = Constraint::parse("::ffff:192.168.1.7/128").unwrap();
        assert!(c.matches(ip("192.168.1.7")));

        let c = Constraint::from("::ffff:172.16.0.0/108".parse::<IpNet>().unwrap());
        assert!(c.matches(ip("172.31.255.255")));
    }

    #[test]
    fn test_parse_cidr() {
        let c = Constraint::parse("127.0.0.1/28").unwrap();
        assert_eq!(c.kind(), "cidr");
        assert!(c.matches(ip("127.0.0.1")));
        assert!(c.matches(ip("127.0.0.15")));
        assert!(!c.matches(ip("127.0.0.17")));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            Constraint::parse("not-an-ip"),
            Err(IpFilterError::InvalidConstraint(_))
        ));
        assert!(matches!(
            Constraint::parse("10.0.0.0/33"),
            Err(IpFilterError::InvalidCidr { .. })
        ));
        assert!(Constraint::parse("").is_err());
    }

    #[test]
    fn test_cidr_family_isolation() {
        let v4 = Constraint::parse("0.0.0.0/0").unwrap();
        let v6 = Constraint::parse("::/0").unwrap();

        assert!(v4.matches(ip("8.8.8.8")));
        assert!(!v4.matches(ip("2001:db8::1")));
        assert!(v6.matches(ip("2001:db8::1")));
        assert!(!v6.matches(ip("8.8.8.8")));
    }

    #[test]
    fn test_cidr_ipv6() {
        let c = Constraint::parse("2001:4860:8007::62/64").unwrap();
        assert!(c.matches(ip("2001:4860:8007:0::62")));
        assert!(c.matches(ip("2001:4860:8007::ffff")));
        assert!(!c.matches(ip("2001:4860:8008::62")));
    }

    #[test]
    fn test_range_bounds_inclusive() {
        let c = Constraint::range(&["127.0.0.3", "127.0.0.35"]).unwrap();

        assert!(c.matches(ip("127.0.0.3")));
        assert!(c.matches(ip("127.0.0.20")));
        assert!(c.matches(ip("127.0.0.35")));
        assert!(!c.matches(ip("127.0.0.2")));
        assert!(!c.matches(ip("127.0.0.36")));
    }

    #[test]
    fn test_range_single() {
        let c = Constraint::range(&["127.0.0.1"]).unwrap();
        assert!(c.matches(ip("127.0.0.1")));
        assert!(!c.matches(ip("127.0.0.2")));
        assert_eq!(c.to_string(), "[127.0.0.1]");
    }

    #[test]
    fn test_range_ipv6() {
        let c = Constraint::range(&["2001:db8::10", "2001:db8::20"]).unwrap();
        assert!(c.matches(ip("2001:db8::10")));
        assert!(c.matches(ip("2001:db8::1a")));
        assert!(!c.matches(ip("2001:db8::21")));
        assert!(!c.matches(ip("0.0.0.16")));
    }

    #[test]
    fn test_range_invalid() {
        assert!(Constraint::range::<&str>(&[]).is_err());
        assert!(Constraint::range(&["1.1.1.1", "1.1.1.2", "1.1.1.3"]).is_err());
        assert!(Constraint::range(&["1.1.1.5", "1.1.1.1"]).is_err());
        assert!(Constraint::range(&["1.1.1.1", "::1"]).is_err());
        assert!(Constraint::range(&["nope"]).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Constraint::parse("10.0.0.1").unwrap().to_string(), "10.0.0.1");
        assert_eq!(
            Constraint::parse("10.0.0.0/8").unwrap().to_string(),
            "10.0.0.0/8"
        );
        assert_eq!(
            Constraint::range(&["10.0.0.1", "10.0.0.9"])
                .unwrap()
                .to_string(),
            "[10.0.0.1, 10.0.0.9]"
        );
    }
}
