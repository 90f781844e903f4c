//! Generic write-through TTL cache.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use tome_core::error::{Result, TomeError};
use tome_core::traits::{Clock, Store, SystemClock};

use crate::normalize::KeyNormalizer;
use crate::policy::ExpirationPolicy;
use crate::record::CacheRecord;

/// In-memory state behind the instance lock.
struct CacheState<K, V> {
    /// `None` until the record is first materialized from the store.
    record: Option<CacheRecord<K, V>>,
    loaded_at: Option<DateTime<Utc>>,
    last_written_at: Option<DateTime<Utc>>,
}

/// A named, persistent cache of normalized keys to values.
///
/// The record is loaded lazily from the [`Store`] on first access and
/// checked against the [`ExpirationPolicy`] exactly then. Every `set` writes
/// the whole record back before returning.
///
/// # Thread Safety
///
/// One mutex per instance serializes loading, reads, and the
/// read-modify-write of `set`, so concurrent writers to different keys never
/// drop each other's entries.
pub struct TtlCache<K, V> {
    name: String,
    policy: ExpirationPolicy,
    normalizer: Box<dyn KeyNormalizer<K>>,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    state: Mutex<CacheState<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    /// Creates a cache instance named `name` (also its store key).
    ///
    /// Nothing is read from the store until the first access.
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn Store>,
        policy: ExpirationPolicy,
        normalizer: impl KeyNormalizer<K> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            policy,
            normalizer: Box::new(normalizer),
            store,
            clock: Arc::new(SystemClock),
            state: Mutex::new(CacheState {
                record: None,
                loaded_at: None,
                last_written_at: None,
            }),
        }
    }

    /// Replaces the time source used for expiration checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the value cached under the normalized form of `key`.
    ///
    /// Purely local: never fails and never reaches the remote catalog.
    pub fn get(&self, key: &K) -> Option<V> {
        let key = self.normalizer.normalize(key);
        let mut state = self.state.lock();
        self.materialize(&mut state).get(&key).cloned()
    }

    /// Returns true if the normalized form of `key` is cached.
    pub fn contains(&self, key: &K) -> bool {
        let key = self.normalizer.normalize(key);
        let mut state = self.state.lock();
        self.materialize(&mut state).contains_key(&key)
    }

    /// Stores `value` under the normalized form of `key` and persists the record.
    ///
    /// The in-memory entry is updated even if persisting fails, in which case
    /// `TomeError::Persistence` is returned and only durability is lost.
    pub fn set(&self, key: K, value: V) -> Result<()> {
        let key = self.normalizer.normalize(&key);
        let mut state = self.state.lock();
        self.materialize(&mut state).insert(key, value);
        self.persist(&mut state)
    }

    /// Drops every entry and removes the stored record.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.record = Some(CacheRecord::new());
        state.last_written_at = None;
        if state.loaded_at.is_none() {
            state.loaded_at = Some(self.clock.now());
        }

        self.store.remove(&self.name).map_err(|e| {
            warn!(cache = %self.name, error = %e, "Failed to remove cache record");
            TomeError::Persistence(format!("failed to remove cache '{}': {}", self.name, e))
        })?;

        info!(cache = %self.name, "Cleared cache");
        Ok(())
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let mut state = self.state.lock();
        self.materialize(&mut state).len()
    }

    /// Returns true if no entries are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cache name, which is also its store key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured expiration policy.
    pub fn policy(&self) -> ExpirationPolicy {
        self.policy
    }

    /// Returns cache statistics, loading the record if needed.
    pub fn stats(&self) -> CacheStats {
        let mut state = self.state.lock();
        let entries = self.materialize(&mut state).len();
        CacheStats {
            name: self.name.clone(),
            entries,
            policy: self.policy,
            loaded_at: state.loaded_at,
            last_written_at: state.last_written_at,
        }
    }

    /// Loads the record on first access; later calls return the in-memory one.
    fn materialize<'a>(&self, state: &'a mut CacheState<K, V>) -> &'a mut CacheRecord<K, V> {
        let CacheState {
            record,
            loaded_at,
            last_written_at,
        } = state;

        record.get_or_insert_with(|| {
            let (loaded, written_at) = self.load_fresh();
            *loaded_at = Some(self.clock.now());
            *last_written_at = written_at;
            loaded
        })
    }

    /// Reads the stored record, falling back to the initial one if it is
    /// missing, unreadable, or stale.
    fn load_fresh(&self) -> (CacheRecord<K, V>, Option<DateTime<Utc>>) {
        let blob = match self.store.load(&self.name) {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                debug!(cache = %self.name, "No stored record, starting empty");
                return (CacheRecord::new(), None);
            }
            Err(e) => {
                warn!(cache = %self.name, error = %e, "Failed to load cache record, starting empty");
                return (CacheRecord::new(), None);
            }
        };

        let now = self.clock.now();
        let age = blob.age(now);
        if self.policy.is_stale(age) {
            info!(
                cache = %self.name,
                age_secs = age.as_secs(),
                policy = %self.policy,
                "Stored record expired, starting empty"
            );
            return (CacheRecord::new(), None);
        }

        // A write time further ahead than one lifetime cannot be trusted.
        let ahead = blob.ahead_of(now);
        if self.policy.is_stale(ahead) {
            warn!(
                cache = %self.name,
                ahead_secs = ahead.as_secs(),
                policy = %self.policy,
                "Stored record is dated in the future, starting empty"
            );
            return (CacheRecord::new(), None);
        }

        match CacheRecord::from_bytes(&blob.payload) {
            Ok(record) => {
                debug!(cache = %self.name, entries = record.len(), "Loaded cache record");
                (record, Some(blob.written_at))
            }
            Err(e) => {
                warn!(cache = %self.name, error = %e, "Stored record is unreadable, starting empty");
                (CacheRecord::new(), None)
            }
        }
    }

    /// Writes the current record through to the store.
    fn persist(&self, state: &mut CacheState<K, V>) -> Result<()> {
        let payload = match &state.record {
            Some(record) => record.to_bytes().map_err(|e| {
                TomeError::Persistence(format!("failed to serialize cache '{}': {}", self.name, e))
            })?,
            None => return Ok(()),
        };

        self.store.save(&self.name, &payload).map_err(|e| {
            warn!(cache = %self.name, error = %e, "Failed to persist cache record");
            TomeError::Persistence(format!("failed to save cache '{}': {}", self.name, e))
        })?;

        state.last_written_at = Some(self.clock.now());
        debug!(cache = %self.name, bytes = payload.len(), "Persisted cache record");
        Ok(())
    }
}

impl<K, V> fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Cache statistics.
#[derive(Clone, Debug)]
pub struct CacheStats {
    /// Cache name
    pub name: String,
    /// Live entries
    pub entries: usize,
    /// Expiration policy
    pub policy: ExpirationPolicy,
    /// When the record was materialized in this process
    pub loaded_at: Option<DateTime<Utc>>,
    /// Last successful write, this process or a previous one
    pub last_written_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tome_core::traits::ManualClock;
    use tome_core::types::StoredBlob;
    use tome_store::{FileStore, MemoryStore};

    use crate::normalize::{FoldedName, Identity};

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn name_cache(store: Arc<dyn Store>, clock: Arc<ManualClock>) -> TtlCache<String, Vec<String>> {
        TtlCache::new("search", store, ExpirationPolicy::After(DAY), FoldedName).with_clock(clock)
    }

    /// Store that counts loads and refuses every save.
    #[derive(Default)]
    struct ReadOnlyStore {
        loads: AtomicUsize,
    }

    impl Store for ReadOnlyStore {
        fn load(&self, _name: &str) -> Result<Option<StoredBlob>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        fn save(&self, _name: &str, _payload: &[u8]) -> Result<()> {
            Err(TomeError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }

        fn remove(&self, _name: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_set_then_get() {
        let clock = Arc::new(ManualClock::default());
        let cache = name_cache(Arc::new(MemoryStore::new()), clock);

        cache.set("Berserk".into(), vec!["30002".into()]).unwrap();

        assert_eq!(cache.get(&"Berserk".into()), Some(vec!["30002".to_string()]));
        assert!(cache.contains(&"berserk".into()));
    }

    #[test]
    fn test_normalization_collision() {
        let clock = Arc::new(ManualClock::default());
        let cache = name_cache(Arc::new(MemoryStore::new()), clock);

        cache.set("One Piece".into(), vec!["a".into()]).unwrap();

        assert_eq!(cache.get(&"one piece".into()), Some(vec!["a".to_string()]));
        assert_eq!(cache.get(&"  ONE   piece ".into()), Some(vec!["a".to_string()]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_miss_is_none() {
        let clock = Arc::new(ManualClock::default());
        let cache = name_cache(Arc::new(MemoryStore::new()), clock);
        assert_eq!(cache.get(&"nothing here".into()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_equivalent_keys_overwrite_one_slot() {
        let clock = Arc::new(ManualClock::default());
        let cache = name_cache(Arc::new(MemoryStore::new()), clock);

        cache.set("Vagabond".into(), vec!["first".into()]).unwrap();
        cache.set("VAGABOND ".into(), vec!["second".into()]).unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"vagabond".into()), Some(vec!["second".to_string()]));
    }

    #[test]
    fn test_write_through_reaches_new_instance() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());

        name_cache(store.clone(), clock.clone())
            .set("Monster".into(), vec!["30001".into()])
            .unwrap();

        let reopened = name_cache(store, clock);
        assert_eq!(reopened.get(&"monster".into()), Some(vec!["30001".to_string()]));
    }

    #[test]
    fn test_duration_policy_expires_whole_record() {
        let clock = Arc::new(ManualClock::default());
        let store: Arc<dyn Store> = Arc::new(MemoryStore::with_clock(clock.clone()));

        let first = name_cache(store.clone(), clock.clone());
        first.set("Monster".into(), vec!["a".into()]).unwrap();
        first.set("Pluto".into(), vec!["b".into()]).unwrap();

        clock.advance(DAY + Duration::from_secs(1));

        let second = name_cache(store, clock);
        assert_eq!(second.get(&"monster".into()), None);
        assert_eq!(second.get(&"pluto".into()), None);
        assert!(second.is_empty());

        second.set("20th Century Boys".into(), vec!["c".into()]).unwrap();
        assert_eq!(second.get(&"monster".into()), None);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_duration_policy_keeps_fresh_record() {
        let clock = Arc::new(ManualClock::default());
        let store: Arc<dyn Store> = Arc::new(MemoryStore::with_clock(clock.clone()));

        name_cache(store.clone(), clock.clone())
            .set("Monster".into(), vec!["a".into()])
            .unwrap();

        clock.advance(DAY - Duration::from_secs(60));

        let second = name_cache(store, clock);
        assert!(second.contains(&"monster".into()));
    }

    #[test]
    fn test_expiry_is_only_checked_on_load() {
        let clock = Arc::new(ManualClock::default());
        let store: Arc<dyn Store> = Arc::new(MemoryStore::with_clock(clock.clone()));

        let cache = name_cache(store, clock.clone());
        cache.set("Monster".into(), vec!["a".into()]).unwrap();

        clock.advance(DAY * 3);
        assert!(cache.contains(&"monster".into()));
    }

    #[test]
    fn test_never_policy_survives_any_gap() {
        let clock = Arc::new(ManualClock::default());
        let store: Arc<dyn Store> = Arc::new(MemoryStore::with_clock(clock.clone()));

        let relations: TtlCache<String, i64> =
            TtlCache::new("relations", store.clone(), ExpirationPolicy::Never, FoldedName)
                .with_clock(clock.clone());
        relations.set("One Piece".into(), 30013).unwrap();

        clock.advance(DAY * 365 * 50);

        let reopened: TtlCache<String, i64> =
            TtlCache::new("relations", store, ExpirationPolicy::Never, FoldedName).with_clock(clock);
        assert_eq!(reopened.get(&"one piece".into()), Some(30013));
    }

    #[test]
    fn test_identity_keys() {
        let cache: TtlCache<i64, String> = TtlCache::new(
            "ids",
            Arc::new(MemoryStore::new()),
            ExpirationPolicy::After(DAY),
            Identity,
        );

        cache.set(30013, "One Piece".into()).unwrap();
        assert_eq!(cache.get(&30013), Some("One Piece".to_string()));
        assert_eq!(cache.get(&30014), None);
    }

    #[test]
    fn test_persistence_failure_keeps_value_visible() {
        let cache: TtlCache<String, i64> = TtlCache::new(
            "relations",
            Arc::new(ReadOnlyStore::default()),
            ExpirationPolicy::Never,
            FoldedName,
        );

        let err = cache.set("Dorohedoro".into(), 30654).unwrap_err();
        assert!(matches!(err, TomeError::Persistence(_)));
        assert_eq!(cache.get(&"dorohedoro".into()), Some(30654));
    }

    #[test]
    fn test_loads_once_per_instance() {
        let store = Arc::new(ReadOnlyStore::default());
        let cache: TtlCache<String, i64> =
            TtlCache::new("relations", store.clone(), ExpirationPolicy::Never, FoldedName);

        cache.get(&"a".into());
        cache.get(&"b".into());
        let _ = cache.set("c".into(), 1);

        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unreadable_payload_starts_empty() {
        let store = Arc::new(MemoryStore::new());
        store.save("search", b"{ definitely not a record").unwrap();

        let cache = name_cache(store, Arc::new(ManualClock::default()));
        assert!(cache.is_empty());
        cache.set("Monster".into(), vec!["a".into()]).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear_removes_stored_record() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());

        let cache = name_cache(store.clone(), clock.clone());
        cache.set("Monster".into(), vec!["a".into()]).unwrap();
        assert_eq!(store.names(), vec!["search".to_string()]);

        cache.clear().unwrap();
        assert!(cache.is_empty());
        assert!(store.is_empty());
        assert_eq!(cache.stats().last_written_at, None);

        let reopened = name_cache(store, clock);
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_clear_reports_remove_failure() {
        struct StuckStore;

        impl Store for StuckStore {
            fn load(&self, _name: &str) -> Result<Option<StoredBlob>> {
                Ok(None)
            }

            fn save(&self, _name: &str, _payload: &[u8]) -> Result<()> {
                Ok(())
            }

            fn remove(&self, _name: &str) -> Result<()> {
                Err(TomeError::Io(std::io::Error::other("busy")))
            }
        }

        let cache = name_cache(Arc::new(StuckStore), Arc::new(ManualClock::default()));
        cache.set("Monster".into(), vec!["a".into()]).unwrap();

        assert!(matches!(cache.clear(), Err(TomeError::Persistence(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_backdated_record_expires() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());

        name_cache(store.clone(), clock.clone())
            .set("Monster".into(), vec!["a".into()])
            .unwrap();
        assert!(store.backdate("search", clock.now() - chrono::Duration::hours(25)));

        assert!(name_cache(store.clone(), clock.clone()).is_empty());

        // Within the lifetime the same record is still served.
        name_cache(store.clone(), clock.clone())
            .set("Monster".into(), vec!["a".into()])
            .unwrap();
        assert!(store.backdate("search", clock.now() - chrono::Duration::hours(23)));
        assert!(name_cache(store, clock).contains(&"monster".into()));
    }

    #[test]
    fn test_record_dated_far_in_the_future_is_stale() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());

        name_cache(store.clone(), clock.clone())
            .set("Monster".into(), vec!["a".into()])
            .unwrap();
        assert!(store.backdate("search", clock.now() + chrono::Duration::days(30)));

        assert!(name_cache(store, clock).is_empty());
    }

    #[test]
    fn test_record_dated_slightly_in_the_future_is_fresh() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());

        name_cache(store.clone(), clock.clone())
            .set("Monster".into(), vec!["a".into()])
            .unwrap();
        assert!(store.backdate("search", clock.now() + chrono::Duration::minutes(5)));

        assert!(name_cache(store, clock).contains(&"monster".into()));
    }

    #[test]
    fn test_never_policy_ignores_future_dates() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());

        let relations: TtlCache<String, i64> =
            TtlCache::new("relations", store.clone(), ExpirationPolicy::Never, FoldedName)
                .with_clock(clock.clone());
        relations.set("Berserk".into(), 30002).unwrap();
        assert!(store.backdate("relations", clock.now() + chrono::Duration::days(3650)));

        let reopened: TtlCache<String, i64> =
            TtlCache::new("relations", store, ExpirationPolicy::Never, FoldedName).with_clock(clock);
        assert_eq!(reopened.get(&"berserk".into()), Some(30002));
    }

    #[test]
    fn test_stats() {
        let clock = Arc::new(ManualClock::default());
        let cache = name_cache(Arc::new(MemoryStore::new()), clock.clone());

        let before = cache.stats();
        assert_eq!(before.entries, 0);
        assert_eq!(before.loaded_at, Some(clock.now()));
        assert_eq!(before.last_written_at, None);

        cache.set("Monster".into(), vec![]).unwrap();
        let after = cache.stats();
        assert_eq!(after.name, "search");
        assert_eq!(after.entries, 1);
        assert_eq!(after.policy, ExpirationPolicy::After(DAY));
        assert_eq!(after.last_written_at, Some(clock.now()));
    }

    #[test]
    fn test_concurrent_sets_to_disjoint_keys_both_survive() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        let cache: TtlCache<i64, String> =
            TtlCache::new("ids", store.clone(), ExpirationPolicy::Never, Identity)
                .with_clock(clock.clone());

        std::thread::scope(|scope| {
            for worker in 0..8_i64 {
                let cache = &cache;
                scope.spawn(move || {
                    for i in 0..25_i64 {
                        let id = worker * 1000 + i;
                        cache.set(id, format!("manga-{id}")).unwrap();
                    }
                });
            }
        });

        assert_eq!(cache.len(), 200);

        let reopened: TtlCache<i64, String> =
            TtlCache::new("ids", store, ExpirationPolicy::Never, Identity).with_clock(clock);
        let expected: HashMap<i64, String> = (0..8_i64)
            .flat_map(|w| (0..25_i64).map(move |i| w * 1000 + i))
            .map(|id| (id, format!("manga-{id}")))
            .collect();
        for (id, value) in expected {
            assert_eq!(reopened.get(&id), Some(value));
        }
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn Store> = Arc::new(FileStore::new(dir.path()).unwrap());
        let clock = Arc::new(ManualClock::default());

        name_cache(store.clone(), clock.clone())
            .set("Oyasumi Punpun".into(), vec!["30093".into()])
            .unwrap();

        let reopened = name_cache(store, clock);
        assert_eq!(
            reopened.get(&"oyasumi punpun".into()),
            Some(vec!["30093".to_string()])
        );
    }
}
