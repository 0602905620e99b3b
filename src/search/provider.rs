use std::time::Duration;

use async_trait::async_trait;

use super::{QueryLimits, SearchError, SearchResult};

/// A web search backend.
///
/// Implementations report failures as errors; the aggregator decides whether a failure is
/// soft (fall through) or surfaced (pinned provider).
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Stable lowercase id used for pinning, e.g. `brave`.
    fn id(&self) -> &str;

    /// Human-facing name used in result labels, e.g. `Brave`.
    fn label(&self) -> &str;

    /// Query-size limits this provider enforces.
    fn limits(&self) -> QueryLimits {
        QueryLimits::unlimited()
    }

    /// Upper bound on one call, enforced by the aggregator.
    fn timeout(&self) -> Duration;

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError>;
}
