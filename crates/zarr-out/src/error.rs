//! Error types for dataset serialization.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dataset has no variables to serialize")]
    EmptyDataset,

    #[error("array shapes are inconsistent: {0}")]
    Shape(String),

    #[error("zarr storage error: {0}")]
    Zarr(String),

    #[error("artifact metadata error: {0}")]
    InvalidArtifact(String),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
