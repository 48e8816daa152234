//! Policy sources supplying the constraint list.

use std::fmt;

use super::constraint::Constraint;
use super::error::IpFilterResult;

/// Supplies the constraint list used for each evaluation.
///
/// Called once per evaluated request, possibly from several threads at once.
/// Every call returns a complete, independent list.
pub trait PolicySource: Send + Sync {
    /// Take a snapshot of the current constraints.
    fn snapshot(&self) -> Vec<Constraint>;
}

/// A fixed constraint list.
#[derive(Debug, Clone, Default)]
pub struct StaticPolicy {
    constraints: Vec<Constraint>,
}

impl StaticPolicy {
    /// Create a static policy from constraints.
    #[must_use]
    pub fn new(constraints: Vec<Constraint>) -> Self {
        Self { constraints }
    }

    /// Parse a static policy from textual addresses and CIDR blocks.
    pub fn parse<I, S>(addresses: I) -> IpFilterResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let constraints = addresses
            .into_iter()
            .map(|addr| Constraint::parse(addr.as_ref()))
            .collect::<IpFilterResult<Vec<_>>>()?;
        Ok(Self::new(constraints))
    }

    /// The configured constraints.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Number of constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Whether the policy holds no constraints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl PolicySource for StaticPolicy {
    fn snapshot(&self) -> Vec<Constraint> {
        self.constraints.clone()
    }
}

impl From<Vec<Constraint>> for StaticPolicy {
    fn from(constraints: Vec<Constraint>) -> Self {
        Self::new(constraints)
    }
}

/// A constraint list produced by a function on every evaluation.
///
/// Lets the address list change without rebuilding the filter.
pub struct DynamicPolicy<F> {
    source: F,
}

impl<F> DynamicPolicy<F>
where
    F: Fn() -> Vec<Constraint> + Send + Sync,
{
    /// Wrap a constraint-producing function.
    pub fn new(source: F) -> Self {
        Self { source }
    }
}

impl<F> PolicySource for DynamicPolicy<F>
where
    F: Fn() -> Vec<Constraint> + Send + Sync,
{
    fn snapshot(&self) -> Vec<Constraint> {
        (self.source)()
    }
}

impl<F> fmt::Debug for DynamicPolicy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicPolicy").finish_non_exhaustive()
    }
}
