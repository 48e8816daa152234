//! # Configuration
//!
//! TOML configuration for the IP filter.
//!
//! ## Example Configuration
//!
//! ```toml
//! mode = "allow"
//! log = true
//! log_level = "deny"
//! allow_private_ips = false
//! allowed_headers = ["cf-connecting-ip", "x-forwarded-for"]
//! excluding = ["^/health"]
//! addresses = [
//!     "127.0.0.1",
//!     "10.0.0.0/8",
//!     "2001:db8::/32",
//!     ["192.168.1.10", "192.168.1.20"],
//! ]
//! ```

mod error;
mod loader;
mod types;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use types::{ConstraintEntry, FilterConfig};
