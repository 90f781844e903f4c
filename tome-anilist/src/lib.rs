//! AniList GraphQL client for Tome.
//!
//! Implements [`RemoteLookup`](tome_core::RemoteLookup): one POST per call,
//! no retries, typed transport/status/decode failures.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod anilist;
mod query;

pub use anilist::{AnilistClient, AnilistConfig};
