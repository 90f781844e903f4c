//! # Tome Cache
//!
//! Generic, persistent, time-to-live cache.
//!
//! A [`TtlCache`] maps normalized keys to values, keeps the whole mapping in
//! one [`CacheRecord`], and writes that record through to a
//! [`Store`](tome_core::Store) on every `set`. Expiration is coarse: an
//! [`ExpirationPolicy`] decides, when the record is first loaded, whether the
//! stored record is still fresh or must start over empty.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tome_cache::{ExpirationPolicy, FoldedName, TtlCache};
//!
//! let cache: TtlCache<String, i64> =
//!     TtlCache::new("relations", store, ExpirationPolicy::Never, FoldedName);
//!
//! cache.set("One Piece".to_string(), 30013)?;
//! assert_eq!(cache.get(&"one piece".to_string()), Some(30013));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cache;
mod normalize;
mod policy;
mod record;

pub use cache::{CacheStats, TtlCache};
pub use normalize::{normalize_name, FoldedName, Identity, KeyNormalizer};
pub use policy::ExpirationPolicy;
pub use record::CacheRecord;
