//! ragdb-embed
//!
//! Embedder implementations and the timeout wrapper every embedding call in
//! the builder and retriever goes through.

use std::sync::Arc;

use ragdb_core::traits::Embedder;

pub mod hashing;
pub mod timeout;

pub use hashing::HashingEmbedder;
pub use timeout::embed_with_timeout;

/// The embedder used by the binaries: a [`HashingEmbedder`] of `dim` buckets.
///
/// Hosts with a real embedding capability construct their own `Arc<dyn
/// Embedder>` and pass it to the builder and retriever instead.
pub fn get_default_embedder(dim: usize) -> Arc<dyn Embedder> {
    tracing::info!(dim, "using hashing embedder");
    Arc::new(HashingEmbedder::new(dim))
}
