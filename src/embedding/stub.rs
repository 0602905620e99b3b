use async_trait::async_trait;
use tracing::debug;

use super::{Embedder, EmbeddingError, normalize, validate_input};
use crate::hashing::hash_to_u64;

/// Deterministic embedder that needs no model or network.
///
/// Text is folded (lowercased, punctuation dropped, whitespace collapsed) before hashing,
/// so `"X causes Y"` and `"x causes y!!"` map to the same unit vector. Anything else is
/// effectively orthogonal.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    embedding_dim: usize,
}

impl StubEmbedder {
    pub fn new(embedding_dim: usize) -> Self {
        Self { embedding_dim }
    }

    /// Canonical text the stub hashes.
    pub fn fold(text: &str) -> String {
        text.chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn embed_folded(&self, folded: &str) -> Vec<f32> {
        let mut embedding = Vec::with_capacity(self.embedding_dim);
        let mut state = hash_to_u64(folded.as_bytes());

        for _ in 0..self.embedding_dim {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            embedding.push(value);
        }

        normalize(embedding)
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        validate_input(text)?;

        let folded = Self::fold(text);
        if folded.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        debug!(text_len = text.len(), "Generating stub embedding");
        Ok(self.embed_folded(&folded))
    }

    fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    fn is_stub(&self) -> bool {
        true
    }
}
