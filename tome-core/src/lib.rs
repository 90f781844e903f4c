//! # Tome Core
//!
//! Core types, errors, and traits shared by every Tome crate.
//!
//! - **Types**: Catalog metadata records (`Manga`) and stored cache blobs
//! - **Errors**: The `TomeError` taxonomy (remote, persistence, validation)
//! - **Constants**: Cache names, default lifetimes, and the AniList endpoint
//! - **Traits**: The `Store`, `RemoteLookup`, and `Clock` seams
//!
//! ## Example
//!
//! ```rust
//! use tome_core::Manga;
//!
//! let manga: Manga = serde_json::from_str(r#"{"id": 30013, "title": {"romaji": "ONE PIECE"}}"#).unwrap();
//! assert_eq!(manga.display_title(), "ONE PIECE");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{Result, TomeError};
pub use traits::*;
pub use types::*;
