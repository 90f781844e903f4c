//! The three cache instances a lookup service works with.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use tome_cache::{CacheStats, ExpirationPolicy, FoldedName, Identity, TtlCache};
use tome_core::constants::{
    DEFAULT_ID_TTL, DEFAULT_SEARCH_TTL, ID_CACHE_NAME, RELATION_CACHE_NAME, SEARCH_CACHE_NAME,
};
use tome_core::error::Result;
use tome_core::traits::{Clock, Store, SystemClock};
use tome_core::types::Manga;

/// Lifetimes of the expiring caches. `None` means never expire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Search-by-name record lifetime
    pub search_ttl: Option<Duration>,
    /// Lookup-by-id record lifetime
    pub id_ttl: Option<Duration>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            search_ttl: Some(DEFAULT_SEARCH_TTL),
            id_ttl: Some(DEFAULT_ID_TTL),
        }
    }
}

/// Search, id, and relation caches sharing one store.
///
/// Each instance has its own name, policy, and lock; none of them
/// invalidates another.
#[derive(Debug)]
pub struct LookupCaches {
    /// Normalized name → ordered search results (expires)
    pub search: TtlCache<String, Vec<Manga>>,
    /// AniList id → record (expires)
    pub ids: TtlCache<i64, Manga>,
    /// Normalized name → AniList id chosen for it (never expires)
    pub relations: TtlCache<String, i64>,
}

impl LookupCaches {
    /// Builds the three caches on top of `store`.
    pub fn open(store: Arc<dyn Store>, settings: &CacheSettings) -> Self {
        Self::open_with_clock(store, settings, Arc::new(SystemClock))
    }

    /// Builds the three caches with an explicit time source.
    pub fn open_with_clock(
        store: Arc<dyn Store>,
        settings: &CacheSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            search: TtlCache::new(
                SEARCH_CACHE_NAME,
                store.clone(),
                ExpirationPolicy::from_ttl(settings.search_ttl),
                FoldedName,
            )
            .with_clock(clock.clone()),
            ids: TtlCache::new(
                ID_CACHE_NAME,
                store.clone(),
                ExpirationPolicy::from_ttl(settings.id_ttl),
                Identity,
            )
            .with_clock(clock.clone()),
            relations: TtlCache::new(RELATION_CACHE_NAME, store, ExpirationPolicy::Never, FoldedName)
                .with_clock(clock),
        }
    }

    /// Statistics for every cache, in search/id/relation order.
    pub fn stats(&self) -> Vec<CacheStats> {
        vec![self.search.stats(), self.ids.stats(), self.relations.stats()]
    }

    /// Empties the expiring caches, leaving relations alone.
    pub fn clear_expiring(&self) -> Result<()> {
        self.search.clear()?;
        self.ids.clear()
    }

    /// Empties every cache, relations included.
    pub fn clear_all(&self) -> Result<()> {
        self.clear_expiring()?;
        self.relations.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tome_core::traits::ManualClock;
    use tome_store::MemoryStore;

    #[test]
    fn test_default_policies() {
        let caches = LookupCaches::open(Arc::new(MemoryStore::new()), &CacheSettings::default());

        assert_eq!(caches.search.policy(), ExpirationPolicy::After(DEFAULT_SEARCH_TTL));
        assert_eq!(caches.ids.policy(), ExpirationPolicy::After(DEFAULT_ID_TTL));
        assert_eq!(caches.relations.policy(), ExpirationPolicy::Never);
    }

    #[test]
    fn test_distinct_names() {
        let caches = LookupCaches::open(Arc::new(MemoryStore::new()), &CacheSettings::default());
        let names: Vec<String> = caches.stats().into_iter().map(|s| s.name).collect();

        assert_eq!(
            names,
            vec![SEARCH_CACHE_NAME, ID_CACHE_NAME, RELATION_CACHE_NAME]
        );
    }

    #[test]
    fn test_caches_do_not_share_records() {
        let store = Arc::new(MemoryStore::new());
        let caches = LookupCaches::open(store.clone(), &CacheSettings::default());

        caches.relations.set("Berserk".into(), 30002).unwrap();
        caches
            .ids
            .set(30002, Manga { id: 30002, ..Default::default() })
            .unwrap();

        assert!(caches.search.is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_clear_expiring_keeps_relations() {
        let clock = Arc::new(ManualClock::default());
        let caches = LookupCaches::open_with_clock(
            Arc::new(MemoryStore::with_clock(clock.clone())),
            &CacheSettings::default(),
            clock,
        );

        caches.search.set("berserk".into(), Vec::new()).unwrap();
        caches.relations.set("berserk".into(), 30002).unwrap();

        caches.clear_expiring().unwrap();
        assert!(caches.search.is_empty());
        assert_eq!(caches.relations.get(&"Berserk".into()), Some(30002));

        caches.clear_all().unwrap();
        assert!(caches.relations.is_empty());
    }

    #[test]
    fn test_never_settings() {
        let settings = CacheSettings {
            search_ttl: None,
            id_ttl: None,
        };
        let caches = LookupCaches::open(Arc::new(MemoryStore::new()), &settings);

        assert_eq!(caches.search.policy(), ExpirationPolicy::Never);
        assert_eq!(caches.ids.policy(), ExpirationPolicy::Never);
    }
}
