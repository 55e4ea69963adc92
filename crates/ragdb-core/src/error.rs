use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Malformed document '{source_id}': {reason}")]
    MalformedDocument { source_id: String, reason: String },

    #[error("Embedding dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Corrupt index snapshot: {0}")]
    CorruptIndex(String),

    #[error("Index format version {found} is not supported (expected {supported})")]
    IncompatibleIndex { found: u32, supported: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
