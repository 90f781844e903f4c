//! File-based blob store.
//!
//! Each cache name maps to one file in the store directory. Saves are atomic
//! (temp file, fsync, rename), so a crash mid-write leaves the previous
//! record intact.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, info, instrument, warn};

use tome_core::constants::{
    STORE_FILE_EXTENSION, STORE_FORMAT_VERSION, STORE_HEADER_SIZE, STORE_MAGIC,
};
use tome_core::error::{Result, TomeError};
use tome_core::traits::{Clock, Store, SystemClock};
use tome_core::types::StoredBlob;

/// File-based blob store.
///
/// # File Format
///
/// ```text
/// magic (4 bytes): "TOME"
/// version (1 byte): 1
/// written_at (8 bytes): milliseconds since the Unix epoch, little-endian
/// payload (variable): the serialized cache record
/// ```
pub struct FileStore {
    /// Directory holding one file per cache name
    dir: PathBuf,
    /// Source of write timestamps
    clock: Arc<dyn Clock>,
}

impl FileStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            TomeError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create cache directory {}: {}", dir.display(), e),
            ))
        })?;

        debug!(dir = %dir.display(), "Opened file store");
        Ok(Self {
            dir,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replaces the clock used to stamp writes.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path used for `name`.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{}.{}", name, STORE_FILE_EXTENSION)))
    }

    /// Encodes a blob into the on-disk layout.
    fn encode(payload: &[u8], written_at: DateTime<Utc>) -> Vec<u8> {
        let mut contents = Vec::with_capacity(STORE_HEADER_SIZE + payload.len());
        contents.extend_from_slice(STORE_MAGIC);
        contents.push(STORE_FORMAT_VERSION);
        contents.extend_from_slice(&written_at.timestamp_millis().to_le_bytes());
        contents.extend_from_slice(payload);
        contents
    }

    /// Decodes the on-disk layout into a blob.
    fn decode(contents: Vec<u8>) -> Result<StoredBlob> {
        if contents.len() < STORE_HEADER_SIZE {
            return Err(TomeError::CorruptBlob("File too short".into()));
        }

        // Verify magic
        if &contents[0..4] != STORE_MAGIC {
            return Err(TomeError::CorruptBlob("Invalid magic bytes".into()));
        }

        // Check version
        let version = contents[4];
        if version != STORE_FORMAT_VERSION {
            return Err(TomeError::VersionMismatch {
                expected: STORE_FORMAT_VERSION,
                actual: version,
            });
        }

        let mut millis = [0u8; 8];
        millis.copy_from_slice(&contents[5..STORE_HEADER_SIZE]);
        let millis = i64::from_le_bytes(millis);
        let written_at = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| TomeError::CorruptBlob(format!("Invalid write timestamp {}", millis)))?;

        let payload = contents[STORE_HEADER_SIZE..].to_vec();
        Ok(StoredBlob::new(payload, written_at))
    }
}

/// Cache names become file names, so only a conservative alphabet is allowed.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TomeError::InvalidCacheName("name cannot be empty".into()));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(TomeError::InvalidCacheName(format!(
            "'{}' may only contain ASCII letters, digits, '_' and '-'",
            name
        )));
    }

    Ok(())
}

impl Store for FileStore {
    #[instrument(skip(self))]
    fn load(&self, name: &str) -> Result<Option<StoredBlob>> {
        let path = self.path_for(name)?;

        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No cache file yet");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let blob = Self::decode(contents)?;
        debug!(bytes = blob.payload.len(), written_at = %blob.written_at, "Loaded cache file");
        Ok(Some(blob))
    }

    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    fn save(&self, name: &str, payload: &[u8]) -> Result<()> {
        let path = self.path_for(name)?;
        let contents = Self::encode(payload, self.clock.now());

        // Write atomically (write to temp, then rename)
        let temp_path = path.with_extension("tmp");
        let written = fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(&contents)?;
            file.sync_all()
        });

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                warn!(path = %temp_path.display(), error = %cleanup, "Failed to remove temp file");
            }
            return Err(e.into());
        }

        fs::rename(&temp_path, &path)?;

        info!(path = %path.display(), "Saved cache file");
        Ok(())
    }

    #[instrument(skip(self))]
    fn remove(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "Removed cache file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
