//! Get-or-fetch orchestration over the lookup caches.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use tome_anilist::AnilistClient;
use tome_cache::{normalize_name, TtlCache};
use tome_core::error::Result;
use tome_core::traits::{RemoteLookup, Store};
use tome_core::types::Manga;
use tome_store::FileStore;

use crate::caches::LookupCaches;
use crate::config::LookupConfig;

/// A lookup answer and where it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved<T> {
    /// The answer
    pub value: T,
    /// Whether it was served without a remote call
    pub from_cache: bool,
}

impl<T> Resolved<T> {
    fn cached(value: T) -> Self {
        Self {
            value,
            from_cache: true,
        }
    }

    fn fetched(value: T) -> Self {
        Self {
            value,
            from_cache: false,
        }
    }
}

/// Resolves catalog metadata, consulting the caches before the network.
///
/// Each lookup follows the same protocol:
/// 1. Check the cache under the normalized key; on a hit, return it
/// 2. On a miss, make one remote call with the caller's raw key
/// 3. On success, cache the answer under the normalized key and return it
/// 4. On failure, return the error untouched and leave the cache alone
pub struct LookupService {
    remote: Arc<dyn RemoteLookup>,
    caches: LookupCaches,
}

impl LookupService {
    /// Creates a service from its collaborators.
    pub fn new(remote: Arc<dyn RemoteLookup>, caches: LookupCaches) -> Self {
        Self { remote, caches }
    }

    /// Creates a service backed by cache files and the AniList client.
    pub fn from_config(config: &LookupConfig) -> Result<Self> {
        let store: Arc<dyn Store> = Arc::new(FileStore::new(&config.cache_dir)?);
        let remote = Arc::new(AnilistClient::with_config(config.anilist.clone())?);
        let caches = LookupCaches::open(store, &config.caches);

        info!(cache_dir = %config.cache_dir.display(), "Lookup service ready");
        Ok(Self::new(remote, caches))
    }

    /// The caches this service reads and populates.
    pub fn caches(&self) -> &LookupCaches {
        &self.caches
    }

    /// Searches by free-text name.
    ///
    /// An empty result list is a valid answer and is cached like any other.
    pub async fn search_by_name(&self, name: &str) -> Result<Vec<Manga>> {
        Ok(self.search_by_name_full(name).await?.value)
    }

    /// Searches by free-text name, reporting whether the cache answered.
    #[instrument(skip(self))]
    pub async fn search_by_name_full(&self, name: &str) -> Result<Resolved<Vec<Manga>>> {
        let key = name.to_string();

        if let Some(mangas) = self.caches.search.get(&key) {
            debug!(results = mangas.len(), "Cache hit");
            return Ok(Resolved::cached(mangas));
        }

        debug!("Cache miss, searching AniList");
        let mangas = self.remote.fetch_by_name(name).await?;

        info!(results = mangas.len(), "Resolved search");
        populate(&self.caches.search, key, mangas.clone());
        Ok(Resolved::fetched(mangas))
    }

    /// Fetches a single record by AniList id.
    pub async fn get_by_id(&self, id: i64) -> Result<Manga> {
        Ok(self.get_by_id_full(id).await?.value)
    }

    /// Fetches a single record by AniList id, reporting whether the cache answered.
    #[instrument(skip(self))]
    pub async fn get_by_id_full(&self, id: i64) -> Result<Resolved<Manga>> {
        if let Some(manga) = self.caches.ids.get(&id) {
            debug!("Cache hit");
            return Ok(Resolved::cached(manga));
        }

        debug!("Cache miss, fetching from AniList");
        let manga = self.remote.fetch_by_id(id).await?;

        info!(title = manga.display_title(), "Resolved id");
        populate(&self.caches.ids, id, manga.clone());
        Ok(Resolved::fetched(manga))
    }

    /// Records that `name` refers to the AniList entry `id`.
    #[instrument(skip(self))]
    pub fn bind(&self, name: &str, id: i64) -> Result<()> {
        self.caches.relations.set(name.to_string(), id)?;
        info!("Bound name to AniList id");
        Ok(())
    }

    /// Returns the AniList id previously bound to `name`, if any.
    pub fn bound_id(&self, name: &str) -> Option<i64> {
        self.caches.relations.get(&name.to_string())
    }

    /// Finds the catalog entry that best matches `name`.
    ///
    /// A bound id wins. Otherwise the search results are scanned for an entry
    /// with a title or synonym equal to `name` after normalization, falling
    /// back to the first result; the choice is remembered as a binding.
    /// Returns `None` when the search comes back empty.
    #[instrument(skip(self))]
    pub async fn find_closest(&self, name: &str) -> Result<Option<Manga>> {
        if let Some(id) = self.bound_id(name) {
            debug!(id, "Using bound id");
            return self.get_by_id(id).await.map(Some);
        }

        let mangas = self.search_by_name(name).await?;
        let wanted = normalize_name(name);

        let closest = mangas
            .iter()
            .find(|manga| manga.names().any(|title| normalize_name(title) == wanted))
            .or_else(|| mangas.first())
            .cloned();

        let Some(closest) = closest else {
            debug!("No candidates");
            return Ok(None);
        };

        info!(id = closest.id, title = closest.display_title(), "Picked closest match");
        populate(&self.caches.relations, name.to_string(), closest.id);
        populate(&self.caches.ids, closest.id, closest.clone());
        Ok(Some(closest))
    }
}

/// Caches a freshly fetched value.
///
/// A persistence failure is only a warning here: the value is already
/// visible in memory and the caller still gets its answer.
fn populate<K, V>(cache: &TtlCache<K, V>, key: K, value: V)
where
    K: Eq + std::hash::Hash + Clone + serde::Serialize + serde::de::DeserializeOwned,
    V: Clone + serde::Serialize + serde::de::DeserializeOwned,
{
    if let Err(e) = cache.set(key, value) {
        warn!(cache = cache.name(), error = %e, "Cached in memory only");
    }
}
