//! In-memory passage index and its versioned JSON snapshot.
//!
//! Snapshot layout (version 1):
//!
//! ```json
//! { "version": 1, "dimension": 768, "built_at": "2026-01-01T00:00:00Z", "records": [ ... ] }
//! ```
//!
//! A bare array of records (the unversioned layout written by earlier
//! ingestion scripts) is still accepted and is rewritten as version 1 on the
//! next persist. Duplicate ids in a snapshot collapse to the last occurrence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use ragdb_core::error::{Error, Result};
use ragdb_core::types::{PassageId, PassageRecord};

pub const INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default)]
pub struct Index {
    records: Vec<PassageRecord>,
    positions: HashMap<PassageId, usize>,
    built_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct SnapshotOut<'a> {
    version: u32,
    dimension: Option<usize>,
    built_at: Option<DateTime<Utc>>,
    records: &'a [PassageRecord],
}

#[derive(Deserialize)]
struct SnapshotIn {
    #[serde(default)]
    dimension: Option<usize>,
    #[serde(default)]
    built_at: Option<DateTime<Utc>>,
    records: Vec<PassageRecord>,
}

impl Index {
    pub fn new() -> Self { Self::default() }

    /// Build an index from records in order; later duplicates replace earlier ones.
    pub fn from_records(records: Vec<PassageRecord>) -> Result<Self> {
        let mut index = Self::new();
        for record in records {
            index.upsert(record)?;
        }
        Ok(index)
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Embedding length shared by every record, `None` while empty.
    pub fn dimension(&self) -> Option<usize> {
        self.records.first().map(|r| r.embedding.len())
    }

    pub fn records(&self) -> &[PassageRecord] { &self.records }

    pub fn get(&self, id: &str) -> Option<&PassageRecord> {
        self.positions.get(id).map(|&i| &self.records[i])
    }

    pub fn built_at(&self) -> Option<DateTime<Utc>> { self.built_at }

    pub fn mark_built(&mut self, at: DateTime<Utc>) { self.built_at = Some(at); }

    /// Insert a record, or replace the one with the same id in place.
    ///
    /// Returns `true` when an existing record was replaced. Fails without
    /// modifying the index if the embedding is empty or its length differs
    /// from the index dimension.
    pub fn upsert(&mut self, record: PassageRecord) -> Result<bool> {
        if record.embedding.is_empty() {
            return Err(Error::InvalidArgument(format!("record '{}' has an empty embedding", record.id)));
        }
        if let Some(expected) = self.dimension() {
            if record.embedding.len() != expected {
                return Err(Error::DimensionMismatch { expected, found: record.embedding.len() });
            }
        }
        if let Some(&pos) = self.positions.get(&record.id) {
            self.records[pos] = record;
            Ok(true)
        } else {
            self.positions.insert(record.id.clone(), self.records.len());
            self.records.push(record);
            Ok(false)
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let snapshot = SnapshotOut {
            version: INDEX_FORMAT_VERSION,
            dimension: self.dimension(),
            built_at: self.built_at,
            records: &self.records,
        };
        serde_json::to_vec(&snapshot).map_err(|e| Error::CorruptIndex(format!("cannot serialize index: {e}")))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| Error::CorruptIndex(format!("not JSON: {e}")))?;

        let (declared_dim, built_at, records) = if value.is_array() {
            let records: Vec<PassageRecord> = serde_json::from_value(value)
                .map_err(|e| Error::CorruptIndex(format!("legacy record list: {e}")))?;
            tracing::info!(records = records.len(), "upgrading unversioned index snapshot");
            (None, None, records)
        } else if value.is_object() {
            let version = value
                .get("version")
                .and_then(serde_json::Value::as_u64)
                .ok_or_else(|| Error::CorruptIndex("snapshot has no version".into()))?;
            if version != u64::from(INDEX_FORMAT_VERSION) {
                return Err(Error::IncompatibleIndex {
                    found: u32::try_from(version).unwrap_or(u32::MAX),
                    supported: INDEX_FORMAT_VERSION,
                });
            }
            let snapshot: SnapshotIn =
                serde_json::from_value(value).map_err(|e| Error::CorruptIndex(format!("snapshot body: {e}")))?;
            (snapshot.dimension, snapshot.built_at, snapshot.records)
        } else {
            return Err(Error::CorruptIndex("snapshot is neither an object nor an array".into()));
        };

        let total = records.len();
        let mut index = Self::from_records(records).map_err(|e| Error::CorruptIndex(e.to_string()))?;
        if let (Some(declared), Some(actual)) = (declared_dim, index.dimension()) {
            if declared != actual {
                return Err(Error::CorruptIndex(format!(
                    "declared dimension {declared} but records have {actual}"
                )));
            }
        }
        if index.len() < total {
            tracing::warn!(duplicates = total - index.len(), "collapsed duplicate passage ids in snapshot");
        }
        index.built_at = built_at;
        Ok(index)
    }
}
