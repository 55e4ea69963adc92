//! ragdb-vector
//!
//! Exhaustive cosine-similarity retrieval over a small, fully in-memory passage
//! index persisted as a single JSON snapshot.
//!
//! - `store`: blob stores (filesystem with atomic replace, in-memory)
//! - `index`: the passage index and its versioned snapshot codec
//! - `index_store`: primary/fallback loading, persistence, writer lock
//! - `builder`: documents → passages → embeddings → persisted index
//! - `search`: cosine scoring and the `Retriever`

pub mod builder;
pub mod index;
pub mod index_store;
pub mod search;
pub mod store;

pub use builder::{Builder, PendingPassage, PreparedPassages};
pub use index::{Index, INDEX_FORMAT_VERSION};
pub use index_store::IndexStore;
pub use search::{cosine_similarity, rank, Retriever, DEFAULT_EMBED_TIMEOUT};
pub use store::{FsBlobStore, MemoryBlobStore};
