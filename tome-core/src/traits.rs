//! Common traits for Tome.
//!
//! These traits define the seams between the cache engine and the outside
//! world, so tests can substitute in-memory stores, scripted catalogs, and
//! manual clocks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::Result;
use crate::types::{Manga, StoredBlob};

// ═══════════════════════════════════════════════════════════════════════════════
// STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Durable, name-keyed blob storage.
///
/// Each cache instance owns exactly one blob, addressed by its cache name.
/// The store stamps every save with the write time; that timestamp is the
/// freshness marker the cache compares against its expiration policy.
///
/// Implementations might use:
/// - One file per cache name (the default)
/// - An in-memory map (for testing)
pub trait Store: Send + Sync {
    /// Loads the blob for `name`, or `None` if nothing was ever saved.
    fn load(&self, name: &str) -> Result<Option<StoredBlob>>;

    /// Replaces the blob for `name` with `payload`, stamped with the current time.
    fn save(&self, name: &str, payload: &[u8]) -> Result<()>;

    /// Removes the blob for `name`. Removing a missing blob is not an error.
    fn remove(&self, name: &str) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// REMOTE LOOKUP TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface to the remote metadata catalog.
///
/// Every call is one network round trip. Implementations fail with
/// `Transport`, `UnexpectedStatus`, or `Decode` and never retry.
#[async_trait]
pub trait RemoteLookup: Send + Sync {
    /// Fetches a single record by its catalog id.
    async fn fetch_by_id(&self, id: i64) -> Result<Manga>;

    /// Searches the catalog by free-text name, preserving the service's ordering.
    ///
    /// An empty list is a valid answer, not an error.
    async fn fetch_by_name(&self, query: &str) -> Result<Vec<Manga>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLOCK TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Source of "now" for expiration checks.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Lets tests simulate arbitrarily long gaps between a cache write and the
/// next process start.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: std::time::Duration) {
        let by = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
        let mut now = self.now.lock();
        *now = now.checked_add_signed(by).unwrap_or(DateTime::<Utc>::MAX_UTC);
    }

    /// Sets the clock to `to`.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
