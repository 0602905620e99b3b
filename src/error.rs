//! Pipeline-wide error taxonomy.
//!
//! Each component has its own error enum. They fold into [`PipelineError`] at the
//! orchestrator and gateway boundaries, where only four outcomes matter to a caller.

use thiserror::Error;

use crate::config::ConfigError;
use crate::dedup::DedupError;
use crate::embedding::EmbeddingError;
use crate::search::SearchError;
use crate::store::StoreError;
use crate::vectordb::ClaimIndexError;
use crate::verdict::VerdictError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed caller input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A collaborator (search provider, embedder, verdict generator) is down or timed out.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Unknown job id.
    #[error("not found: {0}")]
    NotFound(String),

    /// The relational store failed.
    #[error("persistence error: {0}")]
    Persistence(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        PipelineError::Persistence(err.to_string())
    }
}

impl From<SearchError> for PipelineError {
    fn from(err: SearchError) -> Self {
        if err.is_validation() {
            PipelineError::Validation(err.to_string())
        } else {
            PipelineError::UpstreamUnavailable(err.to_string())
        }
    }
}

impl From<EmbeddingError> for PipelineError {
    fn from(err: EmbeddingError) -> Self {
        if err.is_validation() {
            PipelineError::Validation(err.to_string())
        } else {
            PipelineError::UpstreamUnavailable(err.to_string())
        }
    }
}

impl From<ClaimIndexError> for PipelineError {
    fn from(err: ClaimIndexError) -> Self {
        PipelineError::UpstreamUnavailable(err.to_string())
    }
}

impl From<VerdictError> for PipelineError {
    fn from(err: VerdictError) -> Self {
        PipelineError::UpstreamUnavailable(err.to_string())
    }
}

impl From<DedupError> for PipelineError {
    fn from(err: DedupError) -> Self {
        if err.is_validation() {
            PipelineError::Validation(err.to_string())
        } else {
            PipelineError::UpstreamUnavailable(err.to_string())
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        PipelineError::Validation(err.to_string())
    }
}
