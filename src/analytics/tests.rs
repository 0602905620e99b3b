use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::*;
use crate::dedup::{DedupError, SimilarityLookup};
use crate::store::{DangerLevel, MemoryStore, ResultCacheStore};
use crate::vectordb::{SimilarClaim, sort_by_similarity};

/// Similarity table over a fixed set of stored texts.
#[derive(Default)]
struct TableLookup {
    stored: Vec<String>,
    pairs: HashMap<(String, String), f32>,
    failing: HashSet<String>,
}

impl TableLookup {
    fn stored(texts: &[&str]) -> Self {
        Self {
            stored: texts.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn pair(mut self, a: &str, b: &str, similarity: f32) -> Self {
        self.pairs.insert((a.to_string(), b.to_string()), similarity);
        self.pairs.insert((b.to_string(), a.to_string()), similarity);
        self
    }

    /// Every pair among `texts` gets `similarity`.
    fn clique(mut self, texts: &[&str], similarity: f32) -> Self {
        for a in texts {
            for b in texts {
                if a != b {
                    self = self.pair(a, b, similarity);
                }
            }
        }
        self
    }

    fn failing_for(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    fn similarity(&self, a: &str, b: &str) -> f32 {
        if a == b {
            return 1.0;
        }
        self.pairs
            .get(&(a.to_string(), b.to_string()))
            .copied()
            .unwrap_or(0.0)
    }
}

#[async_trait]
impl SimilarityLookup for TableLookup {
    async fn find_similar(
        &self,
        query: &str,
        threshold: f32,
        max_results: usize,
    ) -> Result<Vec<SimilarClaim>, DedupError> {
        if self.failing.contains(query) {
            return Err(DedupError::Timeout {
                operation: "similarity search",
                timeout_ms: 1,
            });
        }
        let mut hits: Vec<SimilarClaim> = self
            .stored
            .iter()
            .map(|text| SimilarClaim::new(text.clone(), self.similarity(query, text)))
            .filter(|hit| hit.similarity >= threshold)
            .collect();
        sort_by_similarity(&mut hits);
        hits.truncate(max_results);
        Ok(hits)
    }
}

fn candidates(rows: &[(&str, i64)]) -> Vec<ClusterCandidate> {
    rows.iter()
        .map(|(q, c)| ClusterCandidate::new(*q, *c))
        .collect()
}

mod cluster_tests {
    use super::*;

    #[tokio::test]
    async fn test_mutually_similar_claims_form_one_cluster() {
        let lookup = TableLookup::stored(&["a", "b", "c"]).clique(&["a", "b", "c"], 0.9);

        let clusters = build_top_list(
            &lookup,
            candidates(&[("b", 3), ("a", 5), ("c", 2)]),
            ClusterThresholds::default(),
            10,
            20,
        )
        .await;

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].representative, "a");
        assert_eq!(clusters[0].total_count, 10);
        assert_eq!(clusters[0].similar_members, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_join_without_absorb_still_merges() {
        // Above join (0.80) but below absorb (0.85): each claim is visited and joins.
        let lookup = TableLookup::stored(&["a", "b", "c"]).clique(&["a", "b", "c"], 0.82);

        let clusters = build_top_list(
            &lookup,
            candidates(&[("a", 5), ("b", 3), ("c", 2)]),
            ClusterThresholds::default(),
            10,
            20,
        )
        .await;

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].total_count, 10);
    }

    #[tokio::test]
    async fn test_dissimilar_claims_stay_singletons() {
        let lookup = TableLookup::stored(&["a", "b", "c", "d"]).pair("a", "b", 0.5);

        let clusters = build_top_list(
            &lookup,
            candidates(&[("a", 4), ("b", 3), ("c", 2), ("d", 1)]),
            ClusterThresholds::default(),
            3,
            20,
        )
        .await;

        let reps: Vec<_> = clusters.iter().map(|c| c.representative.as_str()).collect();
        assert_eq!(reps, vec!["a", "b", "c"]);
        assert!(clusters.iter().all(|c| c.similar_members.is_empty()));

        let all = build_top_list(
            &lookup,
            candidates(&[("a", 4), ("b", 3)]),
            ClusterThresholds::default(),
            10,
            20,
        )
        .await;
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_lookup_failure_makes_singleton_and_continues() {
        let lookup = TableLookup::stored(&["a", "b", "c"])
            .clique(&["b", "c"], 0.9)
            .failing_for("a");

        let clusters = build_top_list(
            &lookup,
            candidates(&[("a", 9), ("b", 3), ("c", 2)]),
            ClusterThresholds::default(),
            10,
            20,
        )
        .await;

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].representative, "a");
        assert_eq!(clusters[0].total_count, 9);
        assert_eq!(clusters[1].total_count, 5);
    }

    #[tokio::test]
    async fn test_severity_outranks_count_for_representative() {
        let lookup = TableLookup::stored(&["mild", "severe"]).pair("mild", "severe", 0.9);
        let input = vec![
            ClusterCandidate::new("mild", 10)
                .with_metadata(ClaimMetadata::with_danger_level(Some(DangerLevel::Low))),
            ClusterCandidate::new("severe", 2)
                .with_metadata(ClaimMetadata::with_danger_level(Some(DangerLevel::Critical))),
        ];

        let clusters =
            build_top_list(&lookup, input, ClusterThresholds::default(), 10, 20).await;

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].representative, "severe");
        assert_eq!(clusters[0].total_count, 12);
        assert_eq!(clusters[0].metadata.danger_level, Some(DangerLevel::Critical));
        assert_eq!(clusters[0].similar_members, vec!["mild"]);
    }

    #[tokio::test]
    async fn test_equal_totals_ordered_by_severity() {
        let lookup = TableLookup::stored(&["a", "b"]);
        let input = vec![
            ClusterCandidate::new("a", 4)
                .with_metadata(ClaimMetadata::with_danger_level(Some(DangerLevel::Low))),
            ClusterCandidate::new("b", 4)
                .with_metadata(ClaimMetadata::with_danger_level(Some(DangerLevel::High))),
        ];

        let clusters =
            build_top_list(&lookup, input, ClusterThresholds::default(), 10, 20).await;
        assert_eq!(clusters[0].representative, "b");
        assert_eq!(clusters[1].representative, "a");
    }

    #[tokio::test]
    async fn test_similar_members_capped_and_distinct() {
        let stored = ["Claim", "claim", "c1", "c2", "c3", "c4", "c5", "c6"];
        let mut lookup = TableLookup::stored(&stored).pair("Claim", "claim", 0.99);
        for other in &stored[2..] {
            lookup = lookup.pair("Claim", other, 0.9);
        }

        let clusters = build_top_list(
            &lookup,
            candidates(&[("Claim", 3)]),
            ClusterThresholds::default(),
            10,
            20,
        )
        .await;

        assert_eq!(
            clusters[0].similar_members,
            vec!["c1", "c2", "c3", "c4", "c5"]
        );
        assert_eq!(clusters[0].total_count, 3);
    }

    #[tokio::test]
    async fn test_duplicate_candidate_rows_are_summed() {
        let lookup = TableLookup::stored(&["a"]);
        let clusters = build_top_list(
            &lookup,
            candidates(&[("a", 2), (" a ", 3)]),
            ClusterThresholds::default(),
            10,
            20,
        )
        .await;

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].total_count, 5);
    }

    #[test]
    fn test_thresholds_validation() {
        assert!(ClusterThresholds::new(0.8, 0.85).is_ok());
        assert!(ClusterThresholds::new(0.8, 0.8).is_ok());
        assert_eq!(
            ClusterThresholds::new(0.9, 0.85).unwrap_err(),
            ThresholdError::AbsorbBelowJoin {
                absorb: 0.85,
                join: 0.9
            }
        );
        assert_eq!(
            ClusterThresholds::new(0.0, 0.85).unwrap_err(),
            ThresholdError::OutOfRange {
                name: "join",
                value: 0.0
            }
        );
        assert!(matches!(
            ClusterThresholds::new(0.8, 1.5),
            Err(ThresholdError::OutOfRange { name: "absorb", .. })
        ));
    }
}

mod service_tests {
    use super::*;

    fn service(store: Arc<MemoryStore>, lookup: TableLookup) -> AnalyticsService {
        AnalyticsService::new(store, Arc::new(lookup), AnalyticsConfig::default())
    }

    #[tokio::test]
    async fn test_top_searched_clusters_counters() {
        let store = Arc::new(MemoryStore::new());
        store.set_search_count("X causes Y", 6);
        store.set_search_count("X Causes Y!!", 2);
        store.set_search_count("moon is cheese", 3);
        let lookup = TableLookup::stored(&["X causes Y", "X Causes Y!!", "moon is cheese"])
            .pair("X causes Y", "X Causes Y!!", 0.92);

        let items = service(store, lookup).top_searched(None).await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].query, "X causes Y");
        assert_eq!(items[0].count, 8);
        assert_eq!(items[0].similar_queries, vec!["X Causes Y!!"]);
        assert_eq!(items[1].query, "moon is cheese");
        assert!(items[1].verdict.is_none());
    }

    #[tokio::test]
    async fn test_lists_are_cached_until_invalidated() {
        let store = Arc::new(MemoryStore::new());
        store.set_search_count("a", 1);
        let analytics = service(store.clone(), TableLookup::stored(&["a", "b"]));

        assert_eq!(analytics.top_searched(Some(5)).await.unwrap().len(), 1);

        store.set_search_count("b", 7);
        assert_eq!(analytics.top_searched(Some(5)).await.unwrap().len(), 1);

        analytics.invalidate();
        let items = analytics.top_searched(Some(5)).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].query, "b");
    }

    #[tokio::test]
    async fn test_limit_is_applied_to_cached_list() {
        let store = Arc::new(MemoryStore::new());
        for (i, q) in ["a", "b", "c", "d"].iter().enumerate() {
            store.set_search_count(q, 10 - i as i64);
        }
        let analytics = service(store, TableLookup::stored(&["a", "b", "c", "d"]));

        assert_eq!(analytics.top_searched(Some(2)).await.unwrap().len(), 2);
        assert_eq!(analytics.top_searched(Some(0)).await.unwrap().len(), 1);
        assert_eq!(analytics.top_searched(Some(500)).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_top_misinformation_attaches_verdict_and_danger() {
        let store = Arc::new(MemoryStore::new());
        store.set_misinformation_count("vaccines cause autism", 4, Some(DangerLevel::High));
        store.set_misinformation_count("Vaccines CAUSE autism!", 1, Some(DangerLevel::Critical));
        store
            .append_result("vaccines cause autism", json!({"verdict": "false"}))
            .await
            .unwrap();
        let lookup = TableLookup::stored(&["vaccines cause autism", "Vaccines CAUSE autism!"])
            .pair("vaccines cause autism", "Vaccines CAUSE autism!", 0.95);

        let items = service(store, lookup).top_misinformation(None).await.unwrap();

        assert_eq!(items.len(), 1);
        // Severity picks the representative.
        assert_eq!(items[0].query, "Vaccines CAUSE autism!");
        assert_eq!(items[0].count, 5);
        assert_eq!(items[0].danger_level, Some(DangerLevel::Critical));
        assert_eq!(items[0].similar_queries, vec!["vaccines cause autism"]);
        // The cached verdict belongs to the other phrasing.
        assert!(items[0].verdict.is_none());
    }

    #[tokio::test]
    async fn test_verdict_attached_for_representative() {
        let store = Arc::new(MemoryStore::new());
        store.set_misinformation_count("flat earth", 3, Some(DangerLevel::Low));
        store
            .append_result("flat earth", json!({"verdict": "false", "confidence": 0.9}))
            .await
            .unwrap();

        let items = service(store, TableLookup::stored(&["flat earth"]))
            .top_misinformation(None)
            .await
            .unwrap();

        assert_eq!(items[0].verdict.as_deref(), Some("false"));
    }

    #[tokio::test]
    async fn test_refresh_task_stops_on_shutdown() {
        let store = Arc::new(MemoryStore::new());
        let analytics = Arc::new(service(store, TableLookup::default()));
        let (tx, rx) = tokio::sync::watch::channel(false);

        let handle = analytics.spawn_refresh(std::time::Duration::from_millis(10), rx);
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("refresh task stops")
            .unwrap();
    }

    #[test]
    fn test_config_validation() {
        assert!(AnalyticsConfig::default().validate().is_ok());

        let config = AnalyticsConfig {
            join_threshold: 0.9,
            absorb_threshold: 0.85,
            ..Default::default()
        };
        match config.validate() {
            Err(crate::config::ConfigError::Constraint { name, reason }) => {
                assert_eq!(name, "VERITY_CLUSTER_ABSORB_THRESHOLD");
                assert!(reason.contains("below join threshold"));
            }
            other => panic!("expected a constraint error, got {other:?}"),
        }

        let config = AnalyticsConfig {
            default_limit: 100,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
