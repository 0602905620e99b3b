use super::*;

mod stub_tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_is_deterministic_and_normalized() {
        let embedder = StubEmbedder::new(64);

        let a = embedder.embed("Vaccines cause autism").await.unwrap();
        let b = embedder.embed("Vaccines cause autism").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_stub_folds_case_and_punctuation() {
        let embedder = StubEmbedder::new(32);

        let a = embedder.embed("X causes Y").await.unwrap();
        let b = embedder.embed("  x Causes   y!! ").await.unwrap();
        let c = embedder.embed("Y causes X").await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_stub_rejects_empty_input() {
        let embedder = StubEmbedder::new(8);

        let err = embedder.embed("   ").await.unwrap_err();
        assert!(err.is_validation());

        let err = embedder.embed("?!...").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::EmptyInput));
    }

    #[test]
    fn test_stub_reports_itself() {
        let embedder = StubEmbedder::new(16);
        assert!(embedder.is_stub());
        assert_eq!(embedder.embedding_dim(), 16);
    }
}

mod http_tests {
    use super::*;

    #[test]
    fn test_http_config_builder() {
        let config = HttpEmbedderConfig::new("http://embedder/embed", 384)
            .with_api_key(Some("secret".to_string()))
            .with_timeout(std::time::Duration::from_millis(500));

        assert_eq!(config.embedding_dim, 384);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout.as_millis(), 500);
    }

    #[test]
    fn test_http_rejects_empty_url() {
        let err = HttpEmbedder::new(HttpEmbedderConfig::new("  ", 384)).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidConfig { .. }));
    }

    #[test]
    fn test_http_rejects_zero_dimension() {
        let err = HttpEmbedder::new(HttpEmbedderConfig::new("http://e/embed", 0)).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidConfig { .. }));
    }

    #[tokio::test]
    async fn test_http_unreachable_service_is_unavailable() {
        let config = HttpEmbedderConfig::new("http://127.0.0.1:9/embed", 8)
            .with_timeout(std::time::Duration::from_millis(300));
        let embedder = HttpEmbedder::new(config).unwrap();

        let err = embedder.embed("anything").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Unavailable { .. }));
        assert!(!err.is_validation());
    }

    #[tokio::test]
    async fn test_http_empty_input_never_hits_network() {
        let embedder = HttpEmbedder::new(HttpEmbedderConfig::new("http://127.0.0.1:9/embed", 8))
            .unwrap();
        let err = embedder.embed("").await.unwrap_err();
        assert!(err.is_validation());
    }
}

mod fixture_tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_vectors_and_failure_mode() {
        let embedder = FixtureEmbedder::new(2).with_vector("a", vec![1.0, 0.0]);

        assert_eq!(embedder.embed("a").await.unwrap(), vec![1.0, 0.0]);
        assert_eq!(embedder.embed("b").await.unwrap().len(), 2);

        embedder.set_failing(true);
        assert!(embedder.embed("a").await.is_err());
        assert_eq!(embedder.calls(), 3);
    }
}
