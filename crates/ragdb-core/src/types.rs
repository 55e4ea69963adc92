//! Domain types shared by the builder, the store and the retriever.

use serde::{Deserialize, Serialize};

pub type PassageId = String;

/// Derive the stable id of a passage from its coordinates.
///
/// Re-indexing the same `(source, page, chunk)` always yields the same id,
/// which is what makes upserts idempotent.
pub fn passage_id(source: &str, page_number: u32, chunk_index: usize) -> PassageId {
    format!("{source}_p{page_number}_c{chunk_index}")
}

/// One page of raw text within a source document.
///
/// `page_number` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page_number: u32,
    pub text: String,
}

/// A raw document handed to the builder: a source identifier plus its pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub source: String,
    pub pages: Vec<Page>,
}

impl SourceDocument {
    pub fn new(source: impl Into<String>, pages: Vec<Page>) -> Self {
        Self { source: source.into(), pages }
    }
}

/// The atomic indexed unit.
///
/// - `id`: `"{source}_p{page_number}_c{chunk_index}"`, see [`passage_id`]
/// - `text`: trimmed passage content
/// - `source`: originating document identifier (file name)
/// - `page_number`: 1-based page within `source`
/// - `embedding`: vector with the dimensionality of the owning index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageRecord {
    pub id: PassageId,
    pub text: String,
    pub source: String,
    pub page_number: u32,
    pub embedding: Vec<f32>,
}

/// A passage returned by search, with its cosine similarity to the query.
///
/// `score` lies in `[-1, 1]`; higher is better.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPassage {
    pub id: PassageId,
    pub text: String,
    pub source: String,
    pub page_number: u32,
    pub score: f32,
}

impl ScoredPassage {
    pub fn from_record(record: &PassageRecord, score: f32) -> Self {
        Self {
            id: record.id.clone(),
            text: record.text.clone(),
            source: record.source.clone(),
            page_number: record.page_number,
            score,
        }
    }
}

/// Outcome of a build run. Failures are collected here instead of aborting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    pub documents_processed: usize,
    /// `(source, reason)` for every document that could not be read.
    pub documents_failed: Vec<(String, String)>,
    pub passages_embedded: usize,
    /// Passages whose embedding call failed or timed out.
    pub passages_skipped: usize,
    /// Chunks dropped for being too short to be meaningful.
    pub passages_discarded: usize,
    /// Records in the persisted index after the build.
    pub index_size: usize,
}
