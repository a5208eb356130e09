use std::path::PathBuf;

use thiserror::Error;

use psynews_core::store::StoreViolation;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The persisted store failed to parse or validate. Fatal for the run:
    /// no merge is attempted against a store we cannot trust.
    #[error("content store at {path} is corrupt: {reason}")]
    StoreCorrupt { path: PathBuf, reason: String },

    /// An in-memory store handed to the pipeline violates its invariants.
    #[error("content store invariant violated: {0}")]
    InvalidStore(#[from] StoreViolation),

    #[error("failed to read content store {path}: {source}")]
    StoreRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write content store {path}: {source}")]
    StoreWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize content store: {0}")]
    Serialize(#[from] serde_json::Error),
}
