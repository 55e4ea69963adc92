//! Offline ingestion: documents → chunks → embeddings → persisted index.
//!
//! Per-passage embedding failures are skipped and counted; unreadable
//! documents are reported in the summary. Only store failures abort a build,
//! and then the previous snapshot stays in place.
//!
//! `build` merges into the stored index. `rebuild` starts from an empty index
//! instead, and still persists exactly once, so a failed rebuild leaves the
//! previous snapshot untouched.

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ragdb_core::chunker::ChunkingConfig;
use ragdb_core::data_processor::DocumentLoader;
use ragdb_core::error::{Error, Result};
use ragdb_core::traits::Embedder;
use ragdb_core::types::{passage_id, BuildSummary, PassageRecord, SourceDocument};
use ragdb_embed::embed_with_timeout;

use crate::index::Index;
use crate::index_store::IndexStore;
use crate::search::DEFAULT_EMBED_TIMEOUT;

/// A chunk that passed the length filter and waits for its embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPassage {
    pub id: String,
    pub text: String,
    pub source: String,
    pub page_number: u32,
}

impl PendingPassage {
    fn into_record(self, embedding: Vec<f32>) -> PassageRecord {
        PassageRecord { id: self.id, text: self.text, source: self.source, page_number: self.page_number, embedding }
    }
}

/// Chunked passages ready for embedding plus bookkeeping from the chunking pass.
#[derive(Debug, Default)]
pub struct PreparedPassages {
    pub passages: Vec<PendingPassage>,
    pub discarded: usize,
    pub documents_processed: usize,
    pub documents_failed: Vec<(String, String)>,
}

pub struct Builder {
    store: Arc<IndexStore>,
    embedder: Arc<dyn Embedder>,
    chunking: ChunkingConfig,
    embed_timeout: Duration,
    concurrency: usize,
    show_progress: bool,
    loader: DocumentLoader,
}

impl Builder {
    pub fn new(store: Arc<IndexStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            chunking: ChunkingConfig::default(),
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
            concurrency: 4,
            show_progress: false,
            loader: DocumentLoader::new(),
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Result<Self> {
        chunking.validate()?;
        self.chunking = chunking;
        Ok(self)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Loader used by `build_from_directory` and `rebuild_from_directory`.
    #[must_use]
    pub fn with_loader(mut self, loader: DocumentLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Chunk every page and assign passage ids, dropping too-short chunks.
    ///
    /// A document with an empty source, a page numbered 0, a repeated page
    /// number, or a source already seen in this batch is reported as malformed
    /// and contributes no passages. Passage ids are therefore unique within a
    /// batch.
    pub fn prepare(&self, documents: &[SourceDocument]) -> Result<PreparedPassages> {
        let mut prepared = PreparedPassages::default();
        let mut seen_sources: HashSet<&str> = HashSet::new();
        for doc in documents {
            let checked = check_document(doc).and_then(|()| {
                if seen_sources.insert(doc.source.as_str()) {
                    Ok(())
                } else {
                    Err(format!("duplicate source '{}' in this batch", doc.source))
                }
            });
            if let Err(reason) = checked {
                let e = Error::MalformedDocument { source_id: doc.source.clone(), reason: reason.clone() };
                tracing::warn!(error = %e, "skipping document");
                prepared.documents_failed.push((doc.source.clone(), reason));
                continue;
            }
            prepared.documents_processed += 1;
            let before = prepared.passages.len();
            for page in &doc.pages {
                for (chunk_index, chunk) in self.chunking.chunk(&page.text)?.into_iter().enumerate() {
                    if !self.chunking.keeps(&chunk) {
                        prepared.discarded += 1;
                        continue;
                    }
                    prepared.passages.push(PendingPassage {
                        id: passage_id(&doc.source, page.page_number, chunk_index),
                        text: chunk,
                        source: doc.source.clone(),
                        page_number: page.page_number,
                    });
                }
            }
            tracing::info!(
                source = %doc.source,
                pages = doc.pages.len(),
                passages = prepared.passages.len() - before,
                "chunked document"
            );
        }
        Ok(prepared)
    }

    /// Index `documents` into the store, merging with what is already there.
    pub async fn build(&self, documents: &[SourceDocument]) -> Result<BuildSummary> {
        let prepared = self.prepare(documents)?;
        self.embed_and_persist(prepared, Mode::Merge).await
    }

    /// Replace the stored index with one built from `documents` only.
    pub async fn rebuild(&self, documents: &[SourceDocument]) -> Result<BuildSummary> {
        let prepared = self.prepare(documents)?;
        self.embed_and_persist(prepared, Mode::Fresh).await
    }

    /// Load every document under `dir` and merge it into the index.
    ///
    /// Unreadable files are reported in the summary; a missing data directory
    /// fails before the store is touched.
    pub async fn build_from_directory(&self, dir: &Path) -> Result<BuildSummary> {
        let prepared = self.prepare_directory(dir)?;
        self.embed_and_persist(prepared, Mode::Merge).await
    }

    /// Like `build_from_directory`, but replaces the stored index.
    pub async fn rebuild_from_directory(&self, dir: &Path) -> Result<BuildSummary> {
        let prepared = self.prepare_directory(dir)?;
        self.embed_and_persist(prepared, Mode::Fresh).await
    }

    fn prepare_directory(&self, dir: &Path) -> Result<PreparedPassages> {
        let loaded = self.loader.load_directory(dir)?;
        let mut prepared = self.prepare(&loaded.documents)?;
        for failure in loaded.failures {
            match failure {
                Error::MalformedDocument { source_id, reason } => prepared.documents_failed.push((source_id, reason)),
                other => prepared.documents_failed.push((dir.display().to_string(), other.to_string())),
            }
        }
        Ok(prepared)
    }

    async fn embed_and_persist(&self, prepared: PreparedPassages, mode: Mode) -> Result<BuildSummary> {
        let _guard = self.store.lock_writer().await;
        let mut index = match mode {
            // Strict load: an unreachable or unreadable store must not be overwritten.
            Mode::Merge => self.store.load()?,
            Mode::Fresh => {
                tracing::info!(key = %self.store.key(), "rebuilding index from scratch");
                Index::new()
            }
        };

        let mut summary = BuildSummary {
            documents_processed: prepared.documents_processed,
            documents_failed: prepared.documents_failed,
            passages_discarded: prepared.discarded,
            ..BuildSummary::default()
        };

        let total = prepared.passages.len();
        tracing::info!(passages = total, existing = index.len(), "embedding passages");
        let pb = self.progress_bar(total as u64);

        let timeout = self.embed_timeout;
        let results: Vec<(PendingPassage, Result<Vec<f32>>)> = stream::iter(prepared.passages)
            .map(|passage| {
                let embedder = Arc::clone(&self.embedder);
                async move {
                    let result = embed_with_timeout(embedder, passage.text.clone(), timeout).await;
                    (passage, result)
                }
            })
            .buffered(self.concurrency)
            .inspect(|_| pb.inc(1))
            .collect()
            .await;
        pb.finish_and_clear();

        for (passage, result) in results {
            let id = passage.id.clone();
            match result.and_then(|embedding| index.upsert(passage.into_record(embedding))) {
                Ok(_) => summary.passages_embedded += 1,
                Err(e) => {
                    tracing::warn!(passage = %id, error = %e, "skipping passage");
                    summary.passages_skipped += 1;
                }
            }
        }

        index.mark_built(chrono::Utc::now());
        self.store.persist(&index)?;
        summary.index_size = index.len();
        tracing::info!(
            documents = summary.documents_processed,
            failed_documents = summary.documents_failed.len(),
            embedded = summary.passages_embedded,
            skipped = summary.passages_skipped,
            discarded = summary.passages_discarded,
            index_size = summary.index_size,
            "build finished"
        );
        Ok(summary)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} passages ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Merge,
    Fresh,
}

fn check_document(doc: &SourceDocument) -> std::result::Result<(), String> {
    if doc.source.trim().is_empty() {
        return Err("document has no source identifier".to_string());
    }
    if doc.pages.iter().any(|p| p.page_number == 0) {
        return Err("page numbers are 1-based, found page 0".to_string());
    }
    let mut pages = HashSet::new();
    if let Some(dup) = doc.pages.iter().find(|p| !pages.insert(p.page_number)) {
        return Err(format!("page {} appears more than once", dup.page_number));
    }
    Ok(())
}
