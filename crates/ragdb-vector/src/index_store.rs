//! Loading and persisting the index snapshot.
//!
//! Load order: primary store, then the optional read-only fallback, then an
//! empty index. Persist always targets the primary and replaces the whole
//! snapshot. Builds hold the writer lock across load → merge → persist so two
//! builds through the same store never interleave.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use ragdb_core::error::{Error, Result};
use ragdb_core::traits::BlobStore;

use crate::index::Index;

pub struct IndexStore {
    primary: Arc<dyn BlobStore>,
    fallback: Option<Arc<dyn BlobStore>>,
    key: String,
    write_lock: Mutex<()>,
}

impl IndexStore {
    pub fn new(primary: Arc<dyn BlobStore>, key: impl Into<String>) -> Self {
        Self { primary, fallback: None, key: key.into(), write_lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn BlobStore>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn key(&self) -> &str { &self.key }

    /// Load the current snapshot.
    ///
    /// Returns an empty index when the stores are reachable but hold nothing,
    /// and `StoreUnavailable` when the primary cannot be reached and no
    /// fallback produced a snapshot.
    pub fn load(&self) -> Result<Index> {
        let primary_error = match self.primary.read(&self.key) {
            Ok(Some(bytes)) => return self.decode(&bytes, &self.primary.describe()),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(store = %self.primary.describe(), error = %e, "primary index store unreachable");
                Some(e)
            }
        };

        if let Some(fallback) = &self.fallback {
            match fallback.read(&self.key) {
                Ok(Some(bytes)) => return self.decode(&bytes, &fallback.describe()),
                Ok(None) => {}
                Err(e) => tracing::warn!(store = %fallback.describe(), error = %e, "fallback index store unreachable"),
            }
        }

        match primary_error {
            Some(e) => Err(e),
            None => {
                tracing::info!(key = %self.key, "no index snapshot found, starting empty");
                Ok(Index::new())
            }
        }
    }

    /// Load for readers: any failure degrades to an empty index.
    pub fn load_or_empty(&self) -> Index {
        self.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "serving from an empty index");
            Index::new()
        })
    }

    /// Replace the persisted snapshot with `index`.
    ///
    /// On error the previous snapshot is left untouched.
    pub fn persist(&self, index: &Index) -> Result<()> {
        let bytes = index.to_bytes()?;
        self.primary.write(&self.key, &bytes).map_err(|e| match e {
            Error::StoreUnavailable(_) => e,
            other => Error::StoreUnavailable(other.to_string()),
        })?;
        tracing::info!(
            store = %self.primary.describe(),
            key = %self.key,
            records = index.len(),
            bytes = bytes.len(),
            "persisted index snapshot"
        );
        Ok(())
    }

    /// Exclusive access for a writer; held for the duration of a build.
    pub async fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    fn decode(&self, bytes: &[u8], origin: &str) -> Result<Index> {
        let index = Index::from_bytes(bytes)?;
        tracing::info!(
            store = %origin,
            key = %self.key,
            records = index.len(),
            dimension = ?index.dimension(),
            "loaded index snapshot"
        );
        Ok(index)
    }
}
