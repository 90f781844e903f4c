//! # Tome Store
//!
//! Blob storage for Tome cache instances.
//!
//! This crate provides two backends for the [`Store`] trait:
//!
//! - **File**: One file per cache name, written atomically, for real use
//! - **Memory**: A map in process memory, for tests and throwaway runs
//!
//! ## Example
//!
//! ```rust,ignore
//! use tome_store::{FileStore, Store};
//!
//! let store = FileStore::new("/var/cache/tome")?;
//! store.save("anilist_id_cache", br#"{"entries":{}}"#)?;
//! let blob = store.load("anilist_id_cache")?.expect("just saved");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// Re-export the trait from core
pub use tome_core::traits::Store;
