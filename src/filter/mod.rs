//! # IP Filter
//!
//! Allow/deny filtering of requests by client IP address.
//!
//! ## Features
//!
//! - **Explicit addresses, CIDR blocks and ranges**: mixed freely in one list,
//!   IPv4 and IPv6
//! - **Allow and deny modes**: whitelist or blacklist semantics
//! - **Proxy headers**: trusted headers checked in priority order
//! - **Private address exception**: permit private ranges unless explicitly denied
//! - **Dynamic policies**: re-read the address list on every request
//! - **Path exclusion**: regex patterns that bypass filtering
//!
//! ## Usage
//!
//! ```ignore
//! use r0n_ipfilter::filter::{FilterMode, FilterSettings, IpFilter, RequestInfo};
//!
//! let settings = FilterSettings::new()
//!     .with_mode(FilterMode::Allow)
//!     .with_allowed_header("x-forwarded-for");
//! let filter = IpFilter::from_addresses(["10.0.0.0/8", "192.168.1.7"], settings)?;
//!
//! let request = RequestInfo::new().with_remote_addr("10.1.2.3:52110");
//! if let Err(denied) = filter.check(&request).into_result() {
//!     // Respond with denied.status()
//! }
//! ```

mod constraint;
mod decision;
mod error;
mod handler;
mod matcher;
mod resolver;
mod settings;
mod source;

pub use constraint::{AddressRange, Constraint};
pub use decision::{Decision, IpDenied};
pub use error::{IpFilterError, IpFilterResult};
pub use handler::IpFilter;
pub use matcher::{is_private, PolicyMatcher};
pub use resolver::{normalize_address, parse_resolved, AddressResolver, RequestInfo};
pub use settings::{tracing_log_sink, DetectIp, FilterMode, FilterSettings, LogLevel, LogSink};
pub use source::{DynamicPolicy, PolicySource, StaticPolicy};
