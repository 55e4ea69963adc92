use crate::error::Result;

/// Maps a piece of text to a fixed-length vector.
///
/// Implementations are external capabilities (a local model, a remote API, a
/// test fake); every vector returned by one instance has length `dim()`.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Byte storage addressed by a logical key.
///
/// `read` returns `Ok(None)` when the medium is reachable but the key does not
/// exist, and `Err(Error::StoreUnavailable)` when the medium cannot be reached.
pub trait BlobStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn write(&self, key: &str, bytes: &[u8]) -> Result<()>;
    /// Human readable location, used in logs.
    fn describe(&self) -> String;
}
