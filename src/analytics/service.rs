use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, instrument, warn};

use super::{AnalyticsConfig, ClaimCluster, ClaimMetadata, ClusterCandidate, build_top_list};
use crate::dedup::SimilarityLookup;
use crate::error::PipelineResult;
use crate::store::{DangerLevel, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopListKind {
    Searched,
    Misinformation,
}

impl fmt::Display for TopListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Searched => f.write_str("top-searched"),
            Self::Misinformation => f.write_str("top-misinformation"),
        }
    }
}

/// One row of a published top list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopItem {
    pub query: String,
    pub count: i64,
    /// Latest cached verdict label for the representative claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger_level: Option<DangerLevel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub similar_queries: Vec<String>,
}

impl From<ClaimCluster> for TopItem {
    fn from(cluster: ClaimCluster) -> Self {
        Self {
            query: cluster.representative,
            count: cluster.total_count,
            verdict: None,
            danger_level: cluster.metadata.danger_level,
            similar_queries: cluster.similar_members,
        }
    }
}

/// Builds and caches the top-searched and top-misinformation lists.
pub struct AnalyticsService {
    store: Arc<dyn Store>,
    lookup: Arc<dyn SimilarityLookup>,
    config: AnalyticsConfig,
    lists: Cache<TopListKind, Arc<Vec<TopItem>>>,
}

impl AnalyticsService {
    pub fn new(
        store: Arc<dyn Store>,
        lookup: Arc<dyn SimilarityLookup>,
        config: AnalyticsConfig,
    ) -> Self {
        let lists = Cache::builder()
            .max_capacity(2)
            .time_to_live(config.cache_ttl)
            .build();
        Self {
            store,
            lookup,
            config,
            lists,
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub async fn top_searched(&self, limit: Option<usize>) -> PipelineResult<Vec<TopItem>> {
        self.top(TopListKind::Searched, limit).await
    }

    pub async fn top_misinformation(&self, limit: Option<usize>) -> PipelineResult<Vec<TopItem>> {
        self.top(TopListKind::Misinformation, limit).await
    }

    async fn top(&self, kind: TopListKind, limit: Option<usize>) -> PipelineResult<Vec<TopItem>> {
        let limit = self.config.clamp_limit(limit);
        let list = match self.lists.get(&kind) {
            Some(list) => {
                debug!(%kind, "serving cached top list");
                list
            }
            None => self.rebuild(kind).await?,
        };
        Ok(list.iter().take(limit).cloned().collect())
    }

    /// Rebuilds one list at `max_limit` and replaces the cached copy.
    #[instrument(skip(self))]
    pub async fn rebuild(&self, kind: TopListKind) -> PipelineResult<Arc<Vec<TopItem>>> {
        let fetch = self
            .config
            .max_limit
            .saturating_mul(self.config.over_fetch_factor);

        let candidates: Vec<ClusterCandidate> = match kind {
            TopListKind::Searched => self
                .store
                .top_search_counts(fetch)
                .await?
                .into_iter()
                .map(|row| ClusterCandidate::new(row.query, row.count))
                .collect(),
            TopListKind::Misinformation => self
                .store
                .top_misinformation_counts(fetch)
                .await?
                .into_iter()
                .map(|row| {
                    ClusterCandidate::new(row.query, row.count)
                        .with_metadata(ClaimMetadata::with_danger_level(row.danger_level))
                })
                .collect(),
        };
        let candidate_count = candidates.len();

        let clusters = build_top_list(
            self.lookup.as_ref(),
            candidates,
            self.config.thresholds(),
            self.config.max_limit,
            self.config.lookup_limit,
        )
        .await;

        let mut items: Vec<TopItem> = clusters.into_iter().map(TopItem::from).collect();
        if kind == TopListKind::Misinformation {
            for item in &mut items {
                item.verdict = self.latest_verdict(&item.query).await;
            }
        }

        info!(%kind, candidates = candidate_count, items = items.len(), "top list rebuilt");
        let items = Arc::new(items);
        self.lists.insert(kind, Arc::clone(&items));
        Ok(items)
    }

    pub fn invalidate(&self) {
        self.lists.invalidate_all();
    }

    /// Rebuilds both lists every `interval` until `shutdown` flips to `true`.
    pub fn spawn_refresh(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                        continue;
                    }
                }
                for kind in [TopListKind::Searched, TopListKind::Misinformation] {
                    if let Err(e) = self.rebuild(kind).await {
                        warn!(%kind, error = %e, "top list refresh failed");
                    }
                }
            }
            debug!("analytics refresh stopped");
        })
    }

    async fn latest_verdict(&self, query: &str) -> Option<String> {
        match self.store.latest_result(query).await {
            Ok(hit) => hit.and_then(|cached| {
                cached
                    .result
                    .get("verdict")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            }),
            Err(e) => {
                debug!(error = %e, "no verdict for top list item");
                None
            }
        }
    }
}
