//! The unit of storage handed between caches and stores.

use chrono::{DateTime, Utc};

/// An opaque serialized cache record and the time it was written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    /// When the store accepted this payload.
    pub written_at: DateTime<Utc>,
    /// Serialized cache record.
    pub payload: Vec<u8>,
}

impl StoredBlob {
    /// Creates a blob written at `written_at`.
    pub fn new(payload: Vec<u8>, written_at: DateTime<Utc>) -> Self {
        Self {
            written_at,
            payload,
        }
    }

    /// Time elapsed between the write and `now`.
    ///
    /// Returns zero if the write appears to be in the future; see [`ahead_of`](Self::ahead_of).
    pub fn age(&self, now: DateTime<Utc>) -> std::time::Duration {
        (now - self.written_at).to_std().unwrap_or_default()
    }

    /// How far the write time lies beyond `now`, zero for past writes.
    pub fn ahead_of(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.written_at - now).to_std().unwrap_or_default()
    }
}
