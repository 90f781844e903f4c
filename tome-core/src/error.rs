//! Error types for Tome.
//!
//! A single `thiserror` hierarchy covers the remote catalog, the persistent
//! store, and configuration. A cache miss is never an error.

use thiserror::Error;

/// Result type alias using `TomeError`.
pub type Result<T> = std::result::Result<T, TomeError>;

/// Main error type for all Tome operations.
#[derive(Debug, Error)]
pub enum TomeError {
    // ═══════════════════════════════════════════════════════════════════════════
    // REMOTE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The catalog service could not be reached (connect, TLS, timeout, I/O).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The catalog service answered with a non-success status.
    #[error("Unexpected response status {status}")]
    UnexpectedStatus {
        /// HTTP status code returned by the service.
        status: u16,
    },

    /// The response body did not match the expected structure.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // PERSISTENCE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Writing a cache record to the store failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A stored blob is truncated or carries the wrong magic bytes.
    #[error("Corrupt cache blob: {0}")]
    CorruptBlob(String),

    /// Stored blob format version mismatch.
    #[error("Cache format version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version this build writes.
        expected: u8,
        /// Version found on disk.
        actual: u8,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Cache name cannot be used as a store key.
    #[error("Invalid cache name: {0}")]
    InvalidCacheName(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TomeError {
    /// Returns true if this error came from talking to the remote catalog.
    pub fn is_remote_error(&self) -> bool {
        matches!(
            self,
            TomeError::Transport(_) | TomeError::UnexpectedStatus { .. } | TomeError::Decode(_)
        )
    }

    /// Returns true if this error came from reading or writing the store.
    pub fn is_persistence_error(&self) -> bool {
        matches!(
            self,
            TomeError::Persistence(_)
                | TomeError::CorruptBlob(_)
                | TomeError::VersionMismatch { .. }
                | TomeError::Io(_)
        )
    }
}
