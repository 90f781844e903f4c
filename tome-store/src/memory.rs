//! In-memory blob store.
//!
//! Fast, thread-safe storage suitable for tests and for runs that should not
//! touch the disk.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use tome_core::error::Result;
use tome_core::traits::{Clock, Store, SystemClock};
use tome_core::types::StoredBlob;

/// In-memory blob store.
///
/// Blobs live only as long as the store; share it through an `Arc` to
/// simulate several process lifetimes against the same "disk".
pub struct MemoryStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Creates an empty store stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store stamped by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Rewrites the write time of an existing blob.
    ///
    /// Returns false if `name` has no blob.
    pub fn backdate(&self, name: &str, written_at: DateTime<Utc>) -> bool {
        match self.blobs.write().get_mut(name) {
            Some(blob) => {
                blob.written_at = written_at;
                true
            }
            None => false,
        }
    }

    /// Names that currently have a blob.
    pub fn names(&self) -> Vec<String> {
        self.blobs.read().keys().cloned().collect()
    }

    /// Returns the number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn load(&self, name: &str) -> Result<Option<StoredBlob>> {
        Ok(self.blobs.read().get(name).cloned())
    }

    fn save(&self, name: &str, payload: &[u8]) -> Result<()> {
        let blob = StoredBlob::new(payload.to_vec(), self.clock.now());
        self.blobs.write().insert(name.to_string(), blob);
        debug!(name, bytes = payload.len(), "Stored blob in memory");
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.blobs.write().remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tome_core::traits::ManualClock;

    #[test]
    fn test_save_and_load() {
        let clock = Arc::new(ManualClock::default());
        let store = MemoryStore::with_clock(clock.clone());

        store.save("ids", b"payload").unwrap();

        let blob = store.load("ids").unwrap().unwrap();
        assert_eq!(blob.payload, b"payload");
        assert_eq!(blob.written_at, clock.now());
    }

    #[test]
    fn test_missing_is_none() {
        let store = MemoryStore::new();
        assert!(store.load("nothing").unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_backdate() {
        let store = MemoryStore::new();
        let long_ago = Utc::now() - Duration::days(30);

        assert!(!store.backdate("ids", long_ago));

        store.save("ids", b"{}").unwrap();
        assert!(store.backdate("ids", long_ago));
        assert_eq!(store.load("ids").unwrap().unwrap().written_at, long_ago);
    }

    #[test]
    fn test_remove() {
        let store = MemoryStore::new();
        store.save("a", b"1").unwrap();
        store.save("b", b"2").unwrap();

        store.remove("a").unwrap();
        assert_eq!(store.names(), vec!["b".to_string()]);
        assert_eq!(store.len(), 1);
    }
}
