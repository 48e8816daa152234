//! The IP filter entry point.

use std::fmt;

use regex::Regex;
use tracing::debug;

use super::constraint::Constraint;
use super::decision::{Decision, IpDenied};
use super::error::{IpFilterError, IpFilterResult};
use super::matcher::PolicyMatcher;
use super::resolver::{parse_resolved, AddressResolver, RequestInfo};
use super::settings::FilterSettings;
use super::source::{PolicySource, StaticPolicy};

/// IP allow/deny filter.
///
/// Built once from a policy source and settings, then shared across
/// requests. Every check takes a fresh snapshot of the policy source.
pub struct IpFilter {
    /// Settings.
    settings: FilterSettings,

    /// Source of the constraint list.
    source: Box<dyn PolicySource>,

    /// Client address extraction.
    resolver: AddressResolver,

    /// Mode and private exception.
    matcher: PolicyMatcher,

    /// Compiled exclusion patterns, paired with their source text.
    excluding: Vec<(String, Regex)>,
}

impl fmt::Debug for IpFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IpFilter")
            .field("settings", &self.settings)
            .field("resolver", &self.resolver)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

impl IpFilter {
    /// Create a filter from a policy source.
    ///
    /// # Errors
    ///
    /// Returns `IpFilterError::InvalidPattern` if an exclusion pattern does
    /// not compile.
    pub fn new<S>(source: S, settings: FilterSettings) -> IpFilterResult<Self>
    where
        S: PolicySource + 'static,
    {
        let excluding = settings
            .excluding
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .map(|re| (pattern.clone(), re))
                    .map_err(|e| IpFilterError::InvalidPattern {
                        pattern: pattern.clone(),
                        source: e,
                    })
            })
            .collect::<IpFilterResult<Vec<_>>>()?;

        let resolver = AddressResolver::new(&settings.allowed_headers, settings.detect_ip.clone());
        let matcher = PolicyMatcher::new(settings.mode, settings.allow_private_ips);

        debug!(
            mode = %settings.mode,
            headers = settings.allowed_headers.len(),
            excluding = excluding.len(),
            "IP filter initialized"
        );

        Ok(Self {
            settings,
            source: Box::new(source),
            resolver,
            matcher,
            excluding,
        })
    }

    /// Create a filter from a fixed constraint list.
    pub fn with_constraints(
        constraints: Vec<Constraint>,
        settings: FilterSettings,
    ) -> IpFilterResult<Self> {
        Self::new(StaticPolicy::new(constraints), settings)
    }

    /// Create a filter from textual addresses and CIDR blocks.
    ///
    /// # Errors
    ///
    /// Fails on the first entry that is neither an address nor a CIDR block.
    pub fn from_addresses<I, S>(addresses: I, settings: FilterSettings) -> IpFilterResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(StaticPolicy::parse(addresses)?, settings)
    }

    /// Settings this filter was built with.
    #[must_use]
    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    /// First exclusion pattern matching a URL.
    #[must_use]
    pub fn excluded_by(&self, url: &str) -> Option<&str> {
        self.excluding
            .iter()
            .find(|(_, re)| re.is_match(url))
            .map(|(pattern, _)| pattern.as_str())
    }

    /// Resolve the client address of a request.
    #[must_use]
    pub fn client_address(&self, request: &RequestInfo) -> String {
        self.resolver.resolve(request)
    }

    /// Evaluate a resolved address against the current policy.
    ///
    /// An address that is empty or does not parse always denies.
    #[must_use]
    pub fn is_permitted(&self, address: &str) -> bool {
        let Some(addr) = parse_resolved(address) else {
            debug!(address, "client address could not be resolved");
            return false;
        };

        let constraints = self.source.snapshot();
        debug!(constraints = constraints.len(), "evaluating policy snapshot");

        self.matcher.evaluate(addr, &constraints)
    }

    /// Check a request.
    ///
    /// Excluded paths are permitted without resolving an address. Decisions
    /// are written to the log sink according to the settings.
    pub fn check(&self, request: &RequestInfo) -> Decision {
        if let Some(pattern) = self.excluded_by(&request.url) {
            debug!(url = %request.url, pattern, "path excluded from IP filtering");
            self.log(&format!("Access granted for excluded path: {pattern}"));
            return Decision::Excluded {
                pattern: pattern.to_string(),
            };
        }

        let address = self.client_address(request);

        if self.is_permitted(&address) {
            if self.settings.log_level.logs_granted() {
                self.log(&format!("Access granted to IP address: {address}"));
            }
            return Decision::permit(address);
        }

        let denied = IpDenied::new(address);
        if self.settings.log_level.logs_denied() {
            self.log(denied.message());
        }
        Decision::Deny(denied)
    }

    /// Check a request and pass the outcome to a continuation.
    ///
    /// `next` receives `None` when the request may proceed and the denial
    /// otherwise.
    pub fn call<F, R>(&self, request: &RequestInfo, next: F) -> R
    where
        F: FnOnce(Option<IpDenied>) -> R,
    {
        match self.check(request) {
            Decision::Deny(denied) => next(Some(denied)),
            Decision::Permit { .. } | Decision::Excluded { .. } => next(None),
        }
    }

    fn log(&self, message: &str) {
        if self.settings.log {
            (self.settings.log_sink)(message);
        }
    }
}
