//! Blob stores backing the index snapshot.
//!
//! `FsBlobStore` keeps one file per key under a root directory and replaces it
//! atomically (temp file in the same directory, fsync, rename), so a reader
//! sees either the previous snapshot or the new one, never a partial write.
//! `MemoryBlobStore` is an in-process map with a switch to simulate outages.

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use tempfile::NamedTempFile;

use ragdb_core::error::{Error, Result};
use ragdb_core::traits::BlobStore;

fn check_key(key: &str) -> Result<()> {
    let path = Path::new(key);
    let single_component = path.components().count() == 1
        && matches!(path.components().next(), Some(std::path::Component::Normal(_)));
    if key.is_empty() || !single_component {
        return Err(Error::InvalidArgument(format!("store key must be a plain file name, got '{key}'")));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf { self.root.join(key) }

    fn unavailable(&self, what: &str, e: &std::io::Error) -> Error {
        Error::StoreUnavailable(format!("{} {}: {}", what, self.root.display(), e))
    }
}

impl BlobStore for FsBlobStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        check_key(key)?;
        match fs::metadata(&self.root) {
            // Nothing has been written yet.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.unavailable("cannot access", &e)),
            Ok(meta) if !meta.is_dir() => {
                return Err(Error::StoreUnavailable(format!("{} is not a directory", self.root.display())))
            }
            Ok(_) => {}
        }
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.unavailable("cannot read from", &e)),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        check_key(key)?;
        fs::create_dir_all(&self.root).map_err(|e| self.unavailable("cannot create", &e))?;
        let mut tmp = NamedTempFile::new_in(&self.root).map_err(|e| self.unavailable("cannot stage write in", &e))?;
        tmp.write_all(bytes).map_err(|e| self.unavailable("cannot write to", &e))?;
        tmp.as_file().sync_all().map_err(|e| self.unavailable("cannot sync", &e))?;
        tmp.persist(self.path_for(key))
            .map_err(|e| self.unavailable("cannot replace snapshot in", &e.error))?;
        Ok(())
    }

    fn describe(&self) -> String { format!("fs:{}", self.root.display()) }
}

#[derive(Debug)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    reachable: AtomicBool,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self { blobs: RwLock::new(HashMap::new()), reachable: AtomicBool::new(true) }
    }
}

impl MemoryBlobStore {
    pub fn new() -> Self { Self::default() }

    /// Simulate the medium going away (`false`) or coming back (`true`).
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::StoreUnavailable("memory store is offline".into()))
        }
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.ensure_reachable()?;
        let blobs = self.blobs.read().map_err(|_| Error::StoreUnavailable("memory store lock poisoned".into()))?;
        Ok(blobs.get(key).cloned())
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.ensure_reachable()?;
        let mut blobs = self.blobs.write().map_err(|_| Error::StoreUnavailable("memory store lock poisoned".into()))?;
        blobs.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn describe(&self) -> String { "memory".to_string() }
}
