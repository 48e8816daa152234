//! # R0N IP Filter
//!
//! IP address access control for R0N Gateway: decides whether a request may
//! proceed based on its client address and an allow/deny policy made of
//! explicit addresses, CIDR blocks and address ranges.
//!
//! ## Features
//!
//! - IPv4 and IPv6 constraints, mixed in one policy
//! - Allow (whitelist) and deny (blacklist) modes
//! - Client address discovery through trusted proxy headers
//! - Private address exception
//! - Static or dynamically re-read policies
//! - TOML configuration
//!
//! ## Modules
//!
//! - [`filter`] - address resolution, policy matching and decisions
//! - [`config`] - configuration file loading

pub mod config;
pub mod filter;
