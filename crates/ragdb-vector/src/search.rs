use std::sync::Arc;
use std::time::Duration;

use ragdb_core::error::{Error, Result};
use ragdb_core::traits::Embedder;
use ragdb_core::types::{PassageRecord, ScoredPassage};
use ragdb_embed::embed_with_timeout;

use crate::index::Index;
use crate::index_store::IndexStore;

pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(10);

/// Cosine similarity in `[-1, 1]`.
///
/// Exactly `0.0` when either vector has zero magnitude or the result is not
/// finite. Vectors of different lengths are compared over their common prefix;
/// callers check dimensions before scoring.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0f64, 0f64, 0f64);
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    #[allow(clippy::cast_possible_truncation)]
    let sim = (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32;
    if sim.is_finite() { sim.clamp(-1.0, 1.0) } else { 0.0 }
}

/// Score every record against `query` and keep the best `top_n`.
///
/// The sort is stable: equal scores keep insertion order.
pub fn rank(query: &[f32], records: &[PassageRecord], top_n: usize) -> Vec<ScoredPassage> {
    let mut scored: Vec<(usize, f32)> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (i, cosine_similarity(query, &r.embedding)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(top_n);
    scored.into_iter().map(|(i, score)| ScoredPassage::from_record(&records[i], score)).collect()
}

/// Exhaustive cosine search over one loaded index snapshot.
///
/// The snapshot is never mutated, so a `Retriever` can serve any number of
/// concurrent searches.
pub struct Retriever {
    index: Arc<Index>,
    embedder: Arc<dyn Embedder>,
    embed_timeout: Duration,
}

impl Retriever {
    pub fn new(index: Arc<Index>, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder, embed_timeout: DEFAULT_EMBED_TIMEOUT }
    }

    /// Load the snapshot from `store`, degrading to an empty index on failure.
    pub fn from_store(store: &IndexStore, embedder: Arc<dyn Embedder>) -> Self {
        Self::new(Arc::new(store.load_or_empty()), embedder)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    pub fn index(&self) -> &Index { &self.index }

    /// Return up to `top_n` passages ordered by descending similarity to `query`.
    ///
    /// An empty index yields an empty result without calling the embedder.
    /// A failed or timed-out query embedding fails the whole search.
    pub async fn search(&self, query: &str, top_n: usize) -> Result<Vec<ScoredPassage>> {
        if top_n == 0 {
            return Err(Error::InvalidArgument("top_n must be greater than 0".into()));
        }
        if self.index.is_empty() {
            tracing::debug!("search against empty index");
            return Ok(Vec::new());
        }

        let query_vec = embed_with_timeout(self.embedder.clone(), query.to_string(), self.embed_timeout).await?;
        if let Some(expected) = self.index.dimension() {
            if query_vec.len() != expected {
                return Err(Error::DimensionMismatch { expected, found: query_vec.len() });
            }
        }

        let results = rank(&query_vec, self.index.records(), top_n);
        tracing::debug!(
            top_n,
            returned = results.len(),
            best = results.first().map(|r| r.score),
            "search complete"
        );
        Ok(results)
    }
}
