use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by claim index operations.
pub enum ClaimIndexError {
    /// Could not connect to the Qdrant endpoint.
    #[error("failed to connect to Qdrant at '{url}': {message}")]
    ConnectionFailed { url: String, message: String },

    /// Collection creation or lookup failed.
    #[error("failed to create collection '{collection}': {message}")]
    CreateCollectionFailed { collection: String, message: String },

    /// Point lookup by id failed.
    #[error("failed to read points from '{collection}': {message}")]
    ReadFailed { collection: String, message: String },

    /// Upsert failed.
    #[error("failed to upsert points to '{collection}': {message}")]
    UpsertFailed { collection: String, message: String },

    /// Search failed.
    #[error("failed to search in '{collection}': {message}")]
    SearchFailed { collection: String, message: String },

    /// Vector dimension mismatch.
    #[error("invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    /// Threshold outside `(0, 1]`.
    #[error("invalid similarity threshold {threshold}: must be in (0, 1]")]
    InvalidThreshold { threshold: f32 },
}
