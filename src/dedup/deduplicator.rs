use std::cmp::Ordering;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::{DedupConfig, DedupError, SimilarityLookup};
use crate::embedding::Embedder;
use crate::store::Store;
use crate::vectordb::{ClaimIndex, SimilarClaim, SimilarityQuery};

/// One string competing to be the canonical form of a claim.
#[derive(Debug)]
struct Contender {
    query: String,
    total: i64,
    has_counters: bool,
    stored: bool,
    similarity: f32,
}

impl Contender {
    /// Best first: counts, then already-tracked text, then stored over fresh input, then
    /// closeness, then text.
    fn rank(a: &Self, b: &Self) -> Ordering {
        b.total
            .cmp(&a.total)
            .then_with(|| b.has_counters.cmp(&a.has_counters))
            .then_with(|| b.stored.cmp(&a.stored))
            .then_with(|| {
                b.similarity
                    .partial_cmp(&a.similarity)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.query.cmp(&b.query))
    }
}

/// Canonicalizes claim text so paraphrases share cache entries and counters.
pub struct ClaimDeduplicator {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn ClaimIndex>,
    store: Arc<dyn Store>,
    config: DedupConfig,
}

impl ClaimDeduplicator {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn ClaimIndex>,
        store: Arc<dyn Store>,
        config: DedupConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            store,
            config,
        }
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn index(&self) -> &Arc<dyn ClaimIndex> {
        &self.index
    }

    /// Stored claims with similarity `>= threshold`, most similar first.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn find_similar(
        &self,
        query: &str,
        threshold: f32,
        max_results: usize,
    ) -> Result<Vec<SimilarClaim>, DedupError> {
        let (_, similar) = self.lookup(query.trim(), threshold, max_results).await?;
        Ok(similar)
    }

    /// Stores an embedding for the exact text unless one exists.
    ///
    /// Returns `true` when a row was written. The embedder is not called for known text.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn ensure_stored(&self, query: &str) -> Result<bool, DedupError> {
        let query = query.trim();
        if self.bounded("index lookup", self.index.contains(query)).await?? {
            return Ok(false);
        }

        let vector = self.bounded("embedding", self.embedder.embed(query)).await??;
        let inserted = self
            .bounded("index insert", self.index.insert_if_absent(query, vector))
            .await??;
        Ok(inserted)
    }

    /// Canonical text for `query`.
    ///
    /// Never fails: any collaborator error is logged and the trimmed query is returned.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn resolve_representative(&self, query: &str, threshold: f32) -> String {
        let query = query.trim();
        match self.try_resolve(query, threshold).await {
            Ok(representative) => {
                if representative != query {
                    debug!(%representative, "claim resolved to existing representative");
                }
                representative
            }
            Err(e) => {
                warn!(error = %e, "representative lookup failed, using claim as-is");
                query.to_string()
            }
        }
    }

    /// [`resolve_representative`](Self::resolve_representative) at the configured threshold.
    pub async fn canonicalize(&self, query: &str) -> String {
        self.resolve_representative(query, self.config.representative_threshold)
            .await
    }

    async fn try_resolve(&self, query: &str, threshold: f32) -> Result<String, DedupError> {
        let (vector, similar) = self
            .lookup(query, threshold, self.config.similar_max_results)
            .await?;

        if similar.is_empty() {
            self.bounded("index insert", self.index.insert_if_absent(query, vector))
                .await??;
            return Ok(query.to_string());
        }

        let input_stored = similar.iter().any(|s| s.query == query);
        let mut contenders = Vec::with_capacity(similar.len() + 1);
        if !input_stored {
            contenders.push(self.contender(query, false, 1.0).await?);
        }
        for claim in &similar {
            contenders.push(self.contender(&claim.query, true, claim.similarity).await?);
        }

        if contenders.iter().all(|c| c.total == 0) {
            // Nothing has been counted yet: the closest stored claim wins.
            return Ok(similar[0].query.clone());
        }

        contenders.sort_by(Contender::rank);
        Ok(contenders.swap_remove(0).query)
    }

    async fn contender(
        &self,
        query: &str,
        stored: bool,
        similarity: f32,
    ) -> Result<Contender, DedupError> {
        let searches = self.store.search_count(query).await?;
        let misinformation = self.store.misinformation_count(query).await?;

        Ok(Contender {
            query: query.to_string(),
            total: searches.unwrap_or(0) + misinformation.unwrap_or(0),
            has_counters: searches.is_some() || misinformation.is_some(),
            stored,
            similarity,
        })
    }

    async fn lookup(
        &self,
        query: &str,
        threshold: f32,
        max_results: usize,
    ) -> Result<(Vec<f32>, Vec<SimilarClaim>), DedupError> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(DedupError::InvalidThreshold { threshold });
        }

        let vector = self.bounded("embedding", self.embedder.embed(query)).await??;
        let request = SimilarityQuery::new(query, vector.clone(), threshold, max_results.max(1));
        let similar = self.bounded("similarity search", self.index.search(request)).await??;

        debug!(hits = similar.len(), threshold, "similarity lookup finished");
        Ok((vector, similar))
    }

    async fn bounded<F, T>(&self, operation: &'static str, fut: F) -> Result<T, DedupError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.config.lookup_timeout, fut)
            .await
            .map_err(|_| DedupError::Timeout {
                operation,
                timeout_ms: u64::try_from(self.config.lookup_timeout.as_millis())
                    .unwrap_or(u64::MAX),
            })
    }
}

#[async_trait]
impl SimilarityLookup for ClaimDeduplicator {
    async fn find_similar(
        &self,
        query: &str,
        threshold: f32,
        max_results: usize,
    ) -> Result<Vec<SimilarClaim>, DedupError> {
        ClaimDeduplicator::find_similar(self, query, threshold, max_results).await
    }
}
