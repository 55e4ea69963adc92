#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ragdb_core::traits::Embedder;
use ragdb_core::types::PassageRecord;

/// Returns a fixed vector per exact text, or fails for unknown text.
pub struct LookupEmbedder {
    dim: usize,
    table: HashMap<String, Vec<f32>>,
    pub calls: AtomicUsize,
}

impl LookupEmbedder {
    pub fn new(dim: usize, entries: &[(&str, Vec<f32>)]) -> Self {
        let table = entries.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect();
        Self { dim, table, calls: AtomicUsize::new(0) }
    }
}

impl Embedder for LookupEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.table.get(text).cloned().ok_or_else(|| anyhow::anyhow!("no vector for '{text}'"))
    }
}

/// Deterministic embedder that fails for any text containing `poison`.
pub struct PoisonEmbedder {
    pub dim: usize,
    pub poison: &'static str,
}

impl Embedder for PoisonEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        if text.contains(self.poison) {
            anyhow::bail!("embedding service rejected input");
        }
        let mut v = vec![0f32; self.dim];
        for (i, b) in text.bytes().enumerate() {
            v[i % self.dim] += f32::from(b);
        }
        Ok(v)
    }
}

/// Sleeps before answering when the text contains `slow`.
pub struct SleepyEmbedder {
    pub delay: Duration,
}

impl Embedder for SleepyEmbedder {
    fn dim(&self) -> usize { 2 }
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        if text.contains("slow") {
            std::thread::sleep(self.delay);
        }
        Ok(vec![1.0, text.len() as f32])
    }
}

pub fn record(id: &str, source: &str, page: u32, embedding: Vec<f32>) -> PassageRecord {
    PassageRecord {
        id: id.to_string(),
        text: format!("passage {id}"),
        source: source.to_string(),
        page_number: page,
        embedding,
    }
}

/// A page of prose long enough to survive the minimum-length filter.
pub fn page_text(topic: &str, sentences: usize) -> String {
    (0..sentences)
        .map(|i| format!("Sentence {i} explains the rules for {topic} in some detail."))
        .collect::<Vec<_>>()
        .join(" ")
}
