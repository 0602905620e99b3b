//! Embedding adapter.
//!
//! - [`HttpEmbedder`] calls an external vectorization service (`{text}` in, `{vector}` out).
//! - [`StubEmbedder`] is deterministic and offline; used when no service is configured.
//!
//! Neither caches. Deduplicating repeated text is the claim deduplicator's job.

mod error;
/// HTTP vectorization client.
pub mod http;
#[cfg(any(test, feature = "mock"))]
/// Fixed-vector embedder for tests.
pub mod mock;
/// Deterministic offline embedder.
pub mod stub;

#[cfg(test)]
mod tests;

pub use error::EmbeddingError;
pub use http::{HttpEmbedder, HttpEmbedderConfig};
#[cfg(any(test, feature = "mock"))]
pub use mock::FixtureEmbedder;
pub use stub::StubEmbedder;

use async_trait::async_trait;

/// Text → fixed-dimension vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds one string. Empty or whitespace-only input is rejected.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Output dimension every vector from this embedder has.
    fn embedding_dim(&self) -> usize;

    /// Returns `true` for embedders that do not capture meaning.
    fn is_stub(&self) -> bool {
        false
    }
}

pub(crate) fn validate_input(text: &str) -> Result<(), EmbeddingError> {
    if text.trim().is_empty() {
        return Err(EmbeddingError::EmptyInput);
    }
    Ok(())
}

pub(crate) fn normalize(mut embedding: Vec<f32>) -> Vec<f32> {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm > 0.0 {
        for x in &mut embedding {
            *x /= norm;
        }
    }

    embedding
}
