//! Lookup configuration: cache location, catalog client, cache lifetimes.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use tome_anilist::AnilistConfig;

use crate::caches::CacheSettings;

/// Everything needed to build a [`LookupService`](crate::LookupService).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Directory holding the cache files
    pub cache_dir: PathBuf,
    /// Remote catalog client settings
    pub anilist: AnilistConfig,
    /// Cache lifetimes
    pub caches: CacheSettings,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            anilist: AnilistConfig::default(),
            caches: CacheSettings::default(),
        }
    }
}

impl LookupConfig {
    /// Loads configuration from the environment (and a `.env` file, if any).
    ///
    /// # Environment Variables
    /// - `TOME_CACHE_DIR` - Cache directory (default: platform cache dir + `/tome`)
    /// - `TOME_ANILIST_URL` - GraphQL endpoint (default: public AniList)
    /// - `TOME_HTTP_TIMEOUT` - Request timeout in seconds (default: 30)
    /// - `TOME_SEARCH_TTL_HOURS` - Search cache lifetime, `0` = never (default: 24)
    /// - `TOME_ID_TTL_HOURS` - Id cache lifetime, `0` = never (default: 24)
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    ///
    /// Unparsable values are logged and replaced by their defaults.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let cache_dir = var("TOME_CACHE_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);

        let mut anilist = defaults.anilist;
        if let Some(endpoint) = var("TOME_ANILIST_URL") {
            anilist.endpoint = endpoint;
        }
        if let Some(timeout) = parse_var(&var, "TOME_HTTP_TIMEOUT") {
            anilist.timeout_seconds = timeout;
        }

        let caches = CacheSettings {
            search_ttl: parse_var(&var, "TOME_SEARCH_TTL_HOURS")
                .map(hours_to_ttl)
                .unwrap_or(defaults.caches.search_ttl),
            id_ttl: parse_var(&var, "TOME_ID_TTL_HOURS")
                .map(hours_to_ttl)
                .unwrap_or(defaults.caches.id_ttl),
        };

        Self {
            cache_dir,
            anilist,
            caches,
        }
    }

    /// Sets the cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Sets the AniList endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.anilist.endpoint = endpoint.into();
        self
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("tome")
}

fn parse_var(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = var(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "Ignoring unparsable setting");
            None
        }
    }
}

fn hours_to_ttl(hours: u64) -> Option<Duration> {
    (hours > 0).then(|| Duration::from_secs(hours.saturating_mul(60 * 60)))
}
