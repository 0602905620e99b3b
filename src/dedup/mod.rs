//! Claim deduplication.
//!
//! Decides when two differently-worded claims are "the same claim" so that cached verdicts
//! and counters are shared. Similarity comes from the embedder plus the claim index; the
//! choice between near-duplicates comes from the stored counters.

mod config;
mod deduplicator;
mod error;


use async_trait::async_trait;

pub use config::DedupConfig;
pub use deduplicator::ClaimDeduplicator;
pub use error::DedupError;

use crate::vectordb::SimilarClaim;

/// Nearest stored claims for a piece of text.
///
/// The clustering engine depends on this rather than on [`ClaimDeduplicator`] directly.
#[async_trait]
pub trait SimilarityLookup: Send + Sync {
    async fn find_similar(
        &self,
        query: &str,
        threshold: f32,
        max_results: usize,
    ) -> Result<Vec<SimilarClaim>, DedupError>;
}
