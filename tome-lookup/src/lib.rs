//! # Tome Lookup
//!
//! Cache-first resolution of catalog metadata.
//!
//! [`LookupService`] answers each request from its [`LookupCaches`] when it
//! can and otherwise makes exactly one call to the remote catalog, caching
//! the successful answer. Errors are never cached and never retried.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod caches;
mod config;
mod service;

pub use caches::{CacheSettings, LookupCaches};
pub use config::LookupConfig;
pub use service::{LookupService, Resolved};
pub use tome_anilist::{AnilistClient, AnilistConfig};
