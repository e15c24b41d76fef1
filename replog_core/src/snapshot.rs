//! Session snapshot persistence with file locking.
//!
//! The in-progress session is persisted after every mutation so a crash or
//! abandoned tab leaves a recoverable trail. Writes are atomic (temp file,
//! fsync, rename); loads are tolerant so a corrupted snapshot degrades to
//! "nothing to recover" instead of an error.

use crate::types::Session;
use crate::{Error, Result};
use fs2::FileExt;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl Session {
    /// Load a persisted session snapshot with shared locking
    ///
    /// Returns `None` if no snapshot exists. A snapshot that cannot be read
    /// or parsed is logged and treated as absent.
    pub fn load_snapshot(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            tracing::debug!("No session snapshot at {:?}", path);
            return Ok(None);
        }

        let file = match std::fs::File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open snapshot {:?}: {}. Treating as absent.", path, e);
                return Ok(None);
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock snapshot {:?}: {}. Treating as absent.", path, e);
            return Ok(None);
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read snapshot {:?}: {}. Treating as absent.", path, e);
            return Ok(None);
        }

        file.unlock()?;

        match serde_json::from_str::<Session>(&contents) {
            Ok(session) => {
                tracing::debug!("Loaded session snapshot from {:?}", path);
                Ok(Some(session))
            }
            Err(e) => {
                tracing::warn!("Failed to parse snapshot {:?}: {}. Treating as absent.", path, e);
                Ok(None)
            }
        }
    }

    /// Persist this session snapshot with exclusive locking
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file in the same directory
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "snapshot path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved session snapshot to {:?}", path);
        Ok(())
    }
}

/// Remove the persisted snapshot, if any
pub fn clear_snapshot(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("Cleared session snapshot at {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
