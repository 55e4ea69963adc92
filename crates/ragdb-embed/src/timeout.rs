use std::sync::Arc;
use std::time::Duration;

use ragdb_core::error::{Error, Result};
use ragdb_core::traits::Embedder;

/// Run one embedding call on the blocking pool, bounded by `timeout`.
///
/// Failure, panic and timeout all surface as `Error::EmbeddingUnavailable`; a
/// vector whose length differs from `embedder.dim()` is a `DimensionMismatch`.
/// A timed-out call keeps running on its blocking thread, its result is dropped.
pub async fn embed_with_timeout(embedder: Arc<dyn Embedder>, text: String, timeout: Duration) -> Result<Vec<f32>> {
    let expected = embedder.dim();
    let task = tokio::task::spawn_blocking(move || embedder.embed(&text));
    let vector = match tokio::time::timeout(timeout, task).await {
        Err(_) => {
            return Err(Error::EmbeddingUnavailable(format!("timed out after {} ms", timeout.as_millis())))
        }
        Ok(Err(join_err)) => return Err(Error::EmbeddingUnavailable(format!("embedding task failed: {join_err}"))),
        Ok(Ok(Err(e))) => return Err(Error::EmbeddingUnavailable(format!("{e:#}"))),
        Ok(Ok(Ok(vector))) => vector,
    };
    if vector.len() != expected {
        return Err(Error::DimensionMismatch { expected, found: vector.len() });
    }
    Ok(vector)
}
