use async_trait::async_trait;

use super::{ClaimIndex, ClaimIndexError, SimilarClaim, SimilarityQuery};

/// Index whose every call fails, for exercising degraded paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingClaimIndex;

impl FailingClaimIndex {
    fn error(op: &str) -> ClaimIndexError {
        ClaimIndexError::SearchFailed {
            collection: "failing".to_string(),
            message: format!("{op}: index unavailable"),
        }
    }
}

#[async_trait]
impl ClaimIndex for FailingClaimIndex {
    async fn contains(&self, _query: &str) -> Result<bool, ClaimIndexError> {
        Err(Self::error("contains"))
    }

    async fn insert_if_absent(
        &self,
        _query: &str,
        _vector: Vec<f32>,
    ) -> Result<bool, ClaimIndexError> {
        Err(Self::error("insert"))
    }

    async fn search(
        &self,
        _request: SimilarityQuery,
    ) -> Result<Vec<SimilarClaim>, ClaimIndexError> {
        Err(Self::error("search"))
    }

    async fn health_check(&self) -> Result<(), ClaimIndexError> {
        Err(Self::error("health"))
    }
}
