use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Embedder, EmbeddingError, StubEmbedder, validate_input};

/// Embedder with hand-picked vectors for chosen texts.
///
/// Unknown text falls back to [`StubEmbedder`]. Can be switched into a failing mode to
/// exercise degraded paths.
#[derive(Clone)]
pub struct FixtureEmbedder {
    vectors: Arc<RwLock<HashMap<String, Vec<f32>>>>,
    fallback: StubEmbedder,
    failing: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl FixtureEmbedder {
    pub fn new(embedding_dim: usize) -> Self {
        Self {
            vectors: Arc::new(RwLock::new(HashMap::new())),
            fallback: StubEmbedder::new(embedding_dim),
            failing: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_vector(self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.write().insert(text.to_string(), vector);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `embed` calls seen so far (including failed ones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FixtureEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        validate_input(text)?;

        if self.failing.load(Ordering::SeqCst) {
            return Err(EmbeddingError::Unavailable {
                url: "fixture://embedder".to_string(),
                reason: "fixture switched to failing".to_string(),
            });
        }

        if let Some(vector) = self.vectors.read().get(text) {
            return Ok(vector.clone());
        }

        self.fallback.embed(text).await
    }

    fn embedding_dim(&self) -> usize {
        self.fallback.embedding_dim()
    }
}
