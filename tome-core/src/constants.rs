//! Constants shared across Tome crates.
//!
//! Cache names double as store keys, so each one must stay unique and stable
//! across releases or previously written caches become unreachable.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE NAMES
// ═══════════════════════════════════════════════════════════════════════════════

/// Store key for the search-by-name cache.
pub const SEARCH_CACHE_NAME: &str = "anilist_search_cache";

/// Store key for the lookup-by-id cache.
pub const ID_CACHE_NAME: &str = "anilist_id_cache";

/// Store key for the name → AniList id relation cache.
pub const RELATION_CACHE_NAME: &str = "anilist_relation_cache";

// ═══════════════════════════════════════════════════════════════════════════════
// LIFETIMES
// ═══════════════════════════════════════════════════════════════════════════════

/// Default lifetime of the search cache record.
pub const DEFAULT_SEARCH_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default lifetime of the id cache record.
pub const DEFAULT_ID_TTL: Duration = Duration::from_secs(24 * 60 * 60);

// ═══════════════════════════════════════════════════════════════════════════════
// REMOTE CATALOG
// ═══════════════════════════════════════════════════════════════════════════════

/// Public AniList GraphQL endpoint.
pub const ANILIST_GRAPHQL_URL: &str = "https://graphql.anilist.co";

/// Default HTTP timeout for catalog requests, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Results requested per search page.
pub const DEFAULT_SEARCH_PAGE_SIZE: u32 = 30;

// ═══════════════════════════════════════════════════════════════════════════════
// STORE FORMAT
// ═══════════════════════════════════════════════════════════════════════════════

/// Magic bytes at the start of every stored cache file.
pub const STORE_MAGIC: &[u8; 4] = b"TOME";

/// Current stored cache format version.
/// Increment when the header layout changes.
pub const STORE_FORMAT_VERSION: u8 = 1;

/// Header size: magic (4) + version (1) + written-at millis (8).
pub const STORE_HEADER_SIZE: usize = 13;

/// File extension used by the file store.
pub const STORE_FILE_EXTENSION: &str = "cache";
