//! Domain types for Tome.
//!
//! - [`Manga`]: A catalog metadata record as returned by AniList
//! - [`StoredBlob`]: An opaque cache payload plus its write time

mod blob;
mod manga;

pub use blob::*;
pub use manga::*;
