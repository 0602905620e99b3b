//! Claim embedding index.
//!
//! Stores one vector per exact claim text and answers "which stored claims are near this
//! vector". [`QdrantClaimIndex`] is the production backend; [`MemoryClaimIndex`] does a brute
//! force cosine scan and backs single-process deployments and tests.

pub mod client;
pub mod error;
pub mod memory;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;


use async_trait::async_trait;

pub use client::QdrantClaimIndex;
pub use error::ClaimIndexError;
pub use memory::{MemoryClaimIndex, cosine_similarity};
#[cfg(any(test, feature = "mock"))]
pub use mock::FailingClaimIndex;
pub use model::{SimilarClaim, SimilarityQuery, sort_by_similarity};

pub const DEFAULT_COLLECTION_NAME: &str = "claim_embeddings";

pub const DEFAULT_VECTOR_SIZE: u64 = crate::constants::DEFAULT_VECTOR_SIZE_U64;

/// Payload key holding the claim text.
pub const QUERY_PAYLOAD_KEY: &str = "query";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteConsistency {
    /// Wait for the operation to be fully indexed and searchable.
    /// Maps to `wait=true`.
    Strong,
    /// Return immediately after the server acknowledges receipt.
    /// Maps to `wait=false`.
    Eventual,
}

impl From<WriteConsistency> for bool {
    fn from(c: WriteConsistency) -> bool {
        matches!(c, WriteConsistency::Strong)
    }
}

/// Vector-similarity lookup over stored claim embeddings.
#[async_trait]
pub trait ClaimIndex: Send + Sync {
    /// Returns `true` if this exact text already has an embedding.
    async fn contains(&self, query: &str) -> Result<bool, ClaimIndexError>;

    /// Stores `vector` for `query` unless the text is already present.
    ///
    /// Returns `true` when a new row was written. Existing rows are never overwritten.
    async fn insert_if_absent(
        &self,
        query: &str,
        vector: Vec<f32>,
    ) -> Result<bool, ClaimIndexError>;

    /// Stored claims with similarity `>= request.similarity_threshold`, best first.
    async fn search(&self, request: SimilarityQuery)
    -> Result<Vec<SimilarClaim>, ClaimIndexError>;

    /// Cheap reachability probe.
    async fn health_check(&self) -> Result<(), ClaimIndexError> {
        Ok(())
    }
}
