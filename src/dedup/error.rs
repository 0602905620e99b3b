use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::store::StoreError;
use crate::vectordb::ClaimIndexError;

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("claim index failed: {0}")]
    Index(#[from] ClaimIndexError),

    #[error("counter lookup failed: {0}")]
    Store(#[from] StoreError),

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("similarity threshold {threshold} must be in (0, 1]")]
    InvalidThreshold { threshold: f32 },
}

impl DedupError {
    pub fn is_validation(&self) -> bool {
        match self {
            Self::InvalidThreshold { .. } => true,
            Self::Embedding(e) => e.is_validation(),
            _ => false,
        }
    }
}
