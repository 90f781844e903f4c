//! Whole-record expiration policies.

use std::fmt;
use std::time::Duration;

/// Decides whether a stored cache record is still fresh.
///
/// Expiration applies to the entire record, never to single entries: once
/// the last write is older than the configured duration, the next process to
/// load the record starts from an empty one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExpirationPolicy {
    /// The record is kept forever and only grows.
    #[default]
    Never,
    /// The record is discarded once its last write is older than this.
    After(Duration),
}

impl ExpirationPolicy {
    /// Builds a policy from an optional lifetime (`None` means never).
    pub fn from_ttl(ttl: Option<Duration>) -> Self {
        ttl.map_or(Self::Never, Self::After)
    }

    /// Returns the configured lifetime, if any.
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            Self::Never => None,
            Self::After(ttl) => Some(*ttl),
        }
    }

    /// Returns true if a record whose last write is `age` old must be dropped.
    pub fn is_stale(&self, age: Duration) -> bool {
        match self {
            Self::Never => false,
            Self::After(ttl) => age > *ttl,
        }
    }
}

impl fmt::Display for ExpirationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => write!(f, "never"),
            Self::After(ttl) => write!(f, "after {}s", ttl.as_secs()),
        }
    }
}
