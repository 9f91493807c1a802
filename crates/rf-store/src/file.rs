//! A single JSON document persisted with write-temporary-then-replace.

use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use rf_core::{Error, Result};

/// One JSON document on disk.
///
/// Plain reads never fail: a missing file yields `None` and a corrupt file
/// is logged and treated as missing, so the next save replaces it. Writes go to
/// a temporary file in the same directory which is then renamed over the
/// target, so a crash mid-write leaves either the old or the new document.
/// All access through one handle is serialized.
#[derive(Debug)]
pub struct JsonFile<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the document, or `None` if it is absent or unreadable.
    pub fn read(&self) -> Option<T> {
        let _guard = self.lock.lock();
        self.read_unlocked()
    }

    /// Atomically replace the document.
    pub fn save(&self, value: &T) -> Result<()> {
        let _guard = self.lock.lock();
        self.write_unlocked(value)
    }

    fn read_unlocked(&self) -> Option<T> {
        self.read_checked().unwrap_or_else(|e| {
            tracing::warn!("Failed to read {}: {e}; using defaults", self.path.display());
            None
        })
    }

    /// `Ok(None)` for a missing or corrupt document; other I/O failures are
    /// returned so a writer never replaces data it could not see.
    fn read_checked(&self) -> Result<Option<T>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(
                    "Corrupt data in {}: {e}; resetting to defaults",
                    self.path.display()
                );
                Ok(None)
            }
        }
    }

    fn write_unlocked(&self, value: &T) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, value)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| Error::from(e.error))?;

        tracing::trace!("Wrote {}", self.path.display());
        Ok(())
    }
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// The stored document, or `T::default()` if absent or corrupt.
    pub fn load(&self) -> T {
        self.read().unwrap_or_default()
    }

    /// Load, mutate, and save under one lock so concurrent updates through
    /// this handle are never lost.
    ///
    /// A missing or corrupt document starts from `T::default()`. Any other
    /// read failure aborts the update and leaves the file untouched.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        let _guard = self.lock.lock();
        let mut value = self.read_checked()?.unwrap_or_default();
        let out = f(&mut value);
        self.write_unlocked(&value)?;
        Ok(out)
    }
}
