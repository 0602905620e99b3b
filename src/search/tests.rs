use super::*;
use std::sync::Arc;
use std::time::Duration;

fn aggregator(providers: Vec<Arc<dyn SearchProvider>>) -> SearchAggregator {
    SearchAggregator::new(providers, SearchConfig::default()).expect("valid aggregator")
}

/// 500 characters, 60 words.
fn oversized_query() -> String {
    let base = (0..59)
        .map(|i| format!("word{i:03}"))
        .collect::<Vec<_>>()
        .join(" ");
    let filler = "z".repeat(500 - base.len() - 1);
    format!("{base} {filler}")
}

mod cascade_tests {
    use super::*;

    #[tokio::test]
    async fn test_primary_success_is_attributed_to_primary() {
        let brave = Arc::new(ScriptedProvider::returning(
            "brave",
            "Brave",
            sample_results("a.example", 3),
        ));
        let tavily = Arc::new(ScriptedProvider::returning(
            "tavily",
            "Tavily",
            sample_results("b.example", 3),
        ));
        let agg = aggregator(vec![brave.clone(), tavily.clone()]);

        let outcome = agg
            .search("vaccines cause autism", None, &ProviderHint::Auto)
            .await
            .unwrap();

        assert_eq!(outcome.provider_label, "Brave");
        assert_eq!(outcome.results.len(), 3);
        assert!(!outcome.is_synthetic);
        assert!(tavily.calls().is_empty());
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back_to_secondary() {
        let brave = Arc::new(ScriptedProvider::failing("brave", "Brave", 503));
        let tavily = Arc::new(ScriptedProvider::returning(
            "tavily",
            "Tavily",
            sample_results("b.example", 2),
        ));
        let agg = aggregator(vec![brave, tavily]);

        let outcome = agg
            .search("vaccines cause autism", Some(5), &ProviderHint::Auto)
            .await
            .expect("fallback must not surface the primary's error");

        assert_eq!(outcome.provider_label, "Tavily");
        assert!(!outcome.is_synthetic);
        assert_eq!(outcome.results, sample_results("b.example", 2));
    }

    #[tokio::test]
    async fn test_timeout_is_a_soft_failure() {
        let brave = Arc::new(
            ScriptedProvider::new("brave", "Brave")
                .otherwise(ScriptStep::Hang)
                .with_timeout(Duration::from_millis(50)),
        );
        let tavily = Arc::new(ScriptedProvider::returning(
            "tavily",
            "Tavily",
            sample_results("b.example", 1),
        ));
        let agg = aggregator(vec![brave, tavily]);

        let outcome = agg
            .search("moon landing staged", None, &ProviderHint::Auto)
            .await
            .unwrap();
        assert_eq!(outcome.provider_label, "Tavily");
    }

    #[tokio::test]
    async fn test_total_failure_yields_one_synthetic_result() {
        let agg = aggregator(vec![
            Arc::new(ScriptedProvider::failing("brave", "Brave", 500)),
            Arc::new(ScriptedProvider::failing("tavily", "Tavily", 429)),
        ]);

        let outcome = agg
            .search("vaccines cause autism", None, &ProviderHint::Auto)
            .await
            .unwrap();

        assert!(outcome.is_synthetic);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.provider_label, SYNTHETIC_PROVIDER_LABEL);
        assert!(outcome.results[0].snippet.contains("vaccines cause autism"));
    }

    #[tokio::test]
    async fn test_no_providers_yields_synthetic_result() {
        let agg = SearchAggregator::from_config(SearchConfig::default()).unwrap();
        assert!(agg.provider_ids().is_empty());

        let outcome = agg
            .search("anything at all", None, &ProviderHint::Auto)
            .await
            .unwrap();
        assert!(outcome.is_synthetic);
    }

    #[tokio::test]
    async fn test_empty_answers_fall_through_and_end_synthetic() {
        let brave = Arc::new(ScriptedProvider::new("brave", "Brave"));
        let agg = aggregator(vec![brave.clone()]);

        let outcome = agg
            .search("vaccines cause autism", None, &ProviderHint::Auto)
            .await
            .unwrap();

        assert!(outcome.is_synthetic);
        // Simplified form equals the query, so no retry is spent.
        assert_eq!(brave.calls(), vec!["vaccines cause autism".to_string()]);
    }

    #[tokio::test]
    async fn test_results_capped_at_max_results() {
        let agg = aggregator(vec![Arc::new(ScriptedProvider::returning(
            "brave",
            "Brave",
            sample_results("a.example", 10),
        ))]);

        let outcome = agg
            .search("claim", Some(3), &ProviderHint::Auto)
            .await
            .unwrap();
        assert_eq!(outcome.results.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let agg = aggregator(vec![]);
        let err = agg
            .search("   ", None, &ProviderHint::Auto)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidRequest(_)));
        assert!(err.is_validation());
    }
}

mod simplification_tests {
    use super::*;

    #[tokio::test]
    async fn test_oversized_query_is_simplified() {
        let query = oversized_query();
        assert_eq!(query.chars().count(), 500);
        assert_eq!(query.split_whitespace().count(), 60);

        let brave = Arc::new(
            ScriptedProvider::returning("brave", "Brave", sample_results("a.example", 2))
                .with_limits(QueryLimits::new(Some(400), Some(50))),
        );
        let agg = aggregator(vec![brave.clone()]);

        let outcome = agg
            .search(&query, None, &ProviderHint::Auto)
            .await
            .unwrap();

        assert!(outcome.used_simplified_query);
        assert_eq!(outcome.original_query.as_deref(), Some(query.as_str()));
        let sent = brave.calls();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            "word000 word001 word002 word003 word004 word005"
        );
        assert_eq!(outcome.simplified_query.as_deref(), Some(sent[0].as_str()));
    }

    #[tokio::test]
    async fn test_original_query_keeps_surrounding_whitespace() {
        let query = format!("  {}\n", oversized_query());
        let brave = Arc::new(
            ScriptedProvider::returning("brave", "Brave", sample_results("a.example", 2))
                .with_limits(QueryLimits::new(Some(400), Some(50))),
        );
        let agg = aggregator(vec![brave.clone()]);

        let outcome = agg
            .search(&query, None, &ProviderHint::Auto)
            .await
            .unwrap();

        assert!(outcome.used_simplified_query);
        assert_eq!(outcome.original_query.as_deref(), Some(query.as_str()));
        assert_eq!(
            brave.calls(),
            vec!["word000 word001 word002 word003 word004 word005".to_string()]
        );
    }

    #[tokio::test]
    async fn test_query_within_limits_is_sent_untouched() {
        let brave = Arc::new(
            ScriptedProvider::returning("brave", "Brave", sample_results("a.example", 1))
                .with_limits(QueryLimits::new(Some(400), Some(50))),
        );
        let agg = aggregator(vec![brave.clone()]);

        let outcome = agg
            .search("Did the Moon landing really happen in 1969?", None, &ProviderHint::Auto)
            .await
            .unwrap();

        assert!(!outcome.used_simplified_query);
        assert!(outcome.original_query.is_none());
        assert_eq!(
            brave.calls(),
            vec!["Did the Moon landing really happen in 1969?".to_string()]
        );
    }

    #[tokio::test]
    async fn test_zero_results_retry_once_with_simplified_query() {
        let brave = Arc::new(
            ScriptedProvider::new("brave", "Brave")
                .then(ScriptStep::Results(vec![]))
                .otherwise(ScriptStep::Results(sample_results("a.example", 2))),
        );
        let agg = aggregator(vec![brave.clone()]);

        let outcome = agg
            .search("do vaccines really cause autism?", None, &ProviderHint::Auto)
            .await
            .unwrap();

        assert_eq!(
            brave.calls(),
            vec![
                "do vaccines really cause autism?".to_string(),
                "vaccines cause autism".to_string(),
            ]
        );
        assert!(outcome.used_simplified_query);
        assert_eq!(
            outcome.simplified_query.as_deref(),
            Some("vaccines cause autism")
        );
        assert_eq!(
            outcome.original_query.as_deref(),
            Some("do vaccines really cause autism?")
        );
        assert_eq!(outcome.results, sample_results("a.example", 2));
        assert_eq!(outcome.provider_label, "Brave");
    }

    #[tokio::test]
    async fn test_retry_happens_only_once_per_provider() {
        let brave = Arc::new(ScriptedProvider::new("brave", "Brave"));
        let tavily = Arc::new(ScriptedProvider::new("tavily", "Tavily"));
        let agg = aggregator(vec![brave.clone(), tavily.clone()]);

        let outcome = agg
            .search("do vaccines really cause autism?", None, &ProviderHint::Auto)
            .await
            .unwrap();

        assert_eq!(brave.calls().len(), 2);
        assert_eq!(tavily.calls().len(), 2);
        assert!(outcome.is_synthetic);
    }
}

mod combined_tests {
    use super::*;

    #[tokio::test]
    async fn test_combined_merges_and_dedups_by_url() {
        let mut tavily_results = vec![SearchResult::new(
            "Same page",
            "HTTPS://A.EXAMPLE/article-1/#comments",
            "duplicate",
        )];
        tavily_results.extend(sample_results("b.example", 1));

        let agg = aggregator(vec![
            Arc::new(ScriptedProvider::returning(
                "brave",
                "Brave",
                sample_results("a.example", 2),
            )),
            Arc::new(ScriptedProvider::returning("tavily", "Tavily", tavily_results)),
        ]);

        let outcome = agg
            .search("claim", Some(10), &ProviderHint::Combined)
            .await
            .unwrap();

        let urls: Vec<_> = outcome.results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://a.example/article-1",
                "https://a.example/article-2",
                "https://b.example/article-1",
            ]
        );
        assert_eq!(outcome.provider_label, "Brave + Tavily");
        assert!(!outcome.is_synthetic);
    }

    #[tokio::test]
    async fn test_combined_label_reflects_truncated_contributors() {
        let agg = aggregator(vec![
            Arc::new(ScriptedProvider::returning(
                "brave",
                "Brave",
                sample_results("a.example", 3),
            )),
            Arc::new(ScriptedProvider::returning(
                "tavily",
                "Tavily",
                sample_results("b.example", 3),
            )),
        ]);

        let outcome = agg
            .search("claim", Some(2), &ProviderHint::Combined)
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.provider_label, "Brave");
    }

    #[tokio::test]
    async fn test_combined_skips_failed_providers() {
        let agg = aggregator(vec![
            Arc::new(ScriptedProvider::failing("brave", "Brave", 502)),
            Arc::new(ScriptedProvider::returning(
                "tavily",
                "Tavily",
                sample_results("b.example", 2),
            )),
        ]);

        let outcome = agg
            .search("claim", None, &ProviderHint::Combined)
            .await
            .unwrap();
        assert_eq!(outcome.provider_label, "Tavily");
    }

    #[tokio::test]
    async fn test_combined_total_failure_is_synthetic() {
        let agg = aggregator(vec![
            Arc::new(ScriptedProvider::failing("brave", "Brave", 502)),
            Arc::new(ScriptedProvider::failing("tavily", "Tavily", 502)),
        ]);

        let outcome = agg
            .search("claim", None, &ProviderHint::Combined)
            .await
            .unwrap();
        assert!(outcome.is_synthetic);
        assert_eq!(outcome.results.len(), 1);
    }
}

mod pinned_tests {
    use super::*;

    #[tokio::test]
    async fn test_pinned_failure_is_surfaced() {
        let agg = aggregator(vec![
            Arc::new(ScriptedProvider::failing("brave", "Brave", 503)),
            Arc::new(ScriptedProvider::returning(
                "tavily",
                "Tavily",
                sample_results("b.example", 2),
            )),
        ]);

        let err = agg
            .search("claim", None, &ProviderHint::Pinned("brave".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::HttpStatus { status: 503, .. }));
        assert!(!err.is_validation());
    }

    #[tokio::test]
    async fn test_pinned_uses_only_that_provider() {
        let brave = Arc::new(ScriptedProvider::returning(
            "brave",
            "Brave",
            sample_results("a.example", 1),
        ));
        let tavily = Arc::new(ScriptedProvider::returning(
            "tavily",
            "Tavily",
            sample_results("b.example", 1),
        ));
        let agg = aggregator(vec![brave.clone(), tavily.clone()]);

        let outcome = agg
            .search("claim", None, &ProviderHint::Pinned("TAVILY".to_string()))
            .await
            .unwrap();

        assert_eq!(outcome.provider_label, "Tavily");
        assert!(brave.calls().is_empty());
    }

    #[tokio::test]
    async fn test_pinned_empty_answer_is_not_synthetic() {
        let agg = aggregator(vec![Arc::new(ScriptedProvider::new("brave", "Brave"))]);

        let outcome = agg
            .search("claim", None, &ProviderHint::Pinned("brave".to_string()))
            .await
            .unwrap();
        assert!(outcome.results.is_empty());
        assert!(!outcome.is_synthetic);
    }

    #[tokio::test]
    async fn test_unknown_pinned_provider() {
        let agg = aggregator(vec![Arc::new(ScriptedProvider::new("brave", "Brave"))]);

        let err = agg
            .search("claim", None, &ProviderHint::Pinned("bing".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::UnknownProvider(ref id) if id == "bing"));
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.brave_timeout < config.tavily_timeout);
    }

    #[test]
    fn test_clamp_max_results() {
        let config = SearchConfig::default();
        assert_eq!(config.clamp_max_results(None), 5);
        assert_eq!(config.clamp_max_results(Some(0)), 1);
        assert_eq!(config.clamp_max_results(Some(100)), 20);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SearchConfig {
            default_max_results: 50,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SearchError::Config(_))));

        let config = SearchConfig {
            brave_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_provider_ids_rejected() {
        let result = SearchAggregator::new(
            vec![
                Arc::new(ScriptedProvider::new("brave", "Brave")),
                Arc::new(ScriptedProvider::new("BRAVE", "Brave again")),
            ],
            SearchConfig::default(),
        );
        assert!(matches!(result, Err(SearchError::Config(_))));
    }

    #[test]
    fn test_keys_register_providers_in_precedence_order() {
        let config = SearchConfig {
            brave_api_key: Some("brave-key".to_string()),
            tavily_api_key: Some("tavily-key".to_string()),
            ..Default::default()
        };
        let agg = SearchAggregator::from_config(config).unwrap();
        assert_eq!(agg.provider_ids(), vec![BRAVE_PROVIDER_ID, TAVILY_PROVIDER_ID]);
        assert_eq!(agg.max_provider_timeout(), Some(Duration::from_secs(15)));
    }
}

mod types_tests {
    use super::*;

    #[test]
    fn test_provider_hint_parsing() {
        assert_eq!("".parse::<ProviderHint>().unwrap(), ProviderHint::Auto);
        assert_eq!("AUTO".parse::<ProviderHint>().unwrap(), ProviderHint::Auto);
        assert_eq!(
            "combined".parse::<ProviderHint>().unwrap(),
            ProviderHint::Combined
        );
        assert_eq!(
            " Brave ".parse::<ProviderHint>().unwrap(),
            ProviderHint::Pinned("brave".to_string())
        );
        assert!("no such thing!".parse::<ProviderHint>().is_err());
    }

    #[test]
    fn test_query_limits() {
        let limits = QueryLimits::new(Some(10), Some(2));
        assert!(!limits.exceeded_by("two words"));
        assert!(limits.exceeded_by("three small words"));
        assert!(limits.exceeded_by("elevenchars"));
        assert!(!QueryLimits::unlimited().exceeded_by(&"x".repeat(10_000)));

        assert_eq!(limits.fit("three small words"), "three");
        assert_eq!(QueryLimits::new(Some(4), None).fit("abcdefgh"), "abcd");
    }
}

mod parse_tests {
    use crate::search::brave::{parse_brave_response, strip_tags};
    use crate::search::tavily::parse_tavily_response;
    use super::*;

    #[test]
    fn test_brave_nested_categories() {
        let body = r#"{
            "type": "search",
            "web": {"results": [
                {"title": "Fact check", "url": "https://a.example/1", "description": "It is <strong>false</strong>."},
                {"title": "No url", "url": "", "description": "dropped"}
            ]},
            "news": {"results": [
                {"title": "News", "url": "https://n.example/1", "description": "Reported"}
            ]}
        }"#;

        let results = parse_brave_response(body).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].snippet, "It is false.");
        assert_eq!(results[1].url, "https://n.example/1");
    }

    #[test]
    fn test_brave_missing_sections_is_empty() {
        assert!(parse_brave_response(r#"{"type": "search"}"#).unwrap().is_empty());
    }

    #[test]
    fn test_brave_malformed_body() {
        let err = parse_brave_response("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, SearchError::Malformed { .. }));
    }

    #[test]
    fn test_tavily_results() {
        let body = r#"{"query": "q", "results": [
            {"title": "T", "url": "https://t.example/", "content": "body", "score": 0.9}
        ]}"#;
        let results = parse_tavily_response(body).unwrap();
        assert_eq!(
            results,
            vec![SearchResult::new("T", "https://t.example/", "body")]
        );
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<b>bold</b> and plain"), "bold and plain");
        assert_eq!(strip_tags("a > b"), "a > b");
    }
}
