//! On-disk content-addressed audio cache.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{CacheError, CacheKey};

/// Audio cache rooted at a directory.
///
/// Layout is `root/<first two hex chars>/<full hex digest>`; the digest is
/// the only index. Entries never expire.
#[derive(Debug, Clone)]
pub struct TtsCache {
    root: PathBuf,
}

impl TtsCache {
    /// Create a cache rooted at `root`. Nothing is created until the first store.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default cache root: `~/.pack-narrator/tts-cache`.
    pub fn default_root() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pack-narrator")
            .join("tts-cache")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the slot for `key`.
    pub fn slot_path(&self, key: &CacheKey) -> Result<PathBuf, CacheError> {
        let digest = key.digest()?;
        Ok(self.root.join(&digest[..2]).join(&digest))
    }

    /// Copy cached audio for `key` to `destination`.
    ///
    /// Returns `false` on a miss. Read failures are logged and reported as a
    /// miss so synthesis proceeds.
    pub fn lookup(&self, key: &CacheKey, destination: &Path) -> bool {
        match self.try_lookup(key, destination) {
            Ok(true) => {
                info!(path = %destination.display(), "use TTS cached");
                true
            }
            Ok(false) => {
                debug!(path = %destination.display(), "no TTS cache found");
                false
            }
            Err(e) => {
                warn!(error = %e, path = %destination.display(), "TTS cache read failed, treating as miss");
                false
            }
        }
    }

    /// Store the file at `source` as the audio for `key`.
    ///
    /// Failures are logged and otherwise ignored.
    pub fn store(&self, key: &CacheKey, source: &Path) {
        if let Err(e) = self.try_store(key, source) {
            warn!(error = %e, path = %source.display(), "TTS cache write failed, continuing without caching");
        }
    }

    fn try_lookup(&self, key: &CacheKey, destination: &Path) -> Result<bool, CacheError> {
        let slot = self.slot_path(key)?;
        if !slot.is_file() {
            return Ok(false);
        }
        fs::copy(&slot, destination)?;
        Ok(true)
    }

    fn try_store(&self, key: &CacheKey, source: &Path) -> Result<(), CacheError> {
        let slot = self.slot_path(key)?;
        let shard = slot
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "slot has no parent"))?;
        fs::create_dir_all(shard)?;

        // Stage next to the slot and rename so readers never see a partial file
        let mut staged = tempfile::NamedTempFile::new_in(shard)?;
        io::copy(&mut fs::File::open(source)?, staged.as_file_mut())?;
        staged.persist(&slot).map_err(|e| e.error)?;

        debug!(slot = %slot.display(), "stored TTS cache entry");
        Ok(())
    }
}
