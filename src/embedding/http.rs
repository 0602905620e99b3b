use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{Embedder, EmbeddingError, validate_input};
use crate::constants::validate_embedding_dim;

/// Connection settings for [`HttpEmbedder`].
#[derive(Debug, Clone)]
pub struct HttpEmbedderConfig {
    /// Full endpoint URL, e.g. `http://embedder:9000/embed`.
    pub url: String,
    /// Sent as a bearer token when present.
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub embedding_dim: usize,
}

impl HttpEmbedderConfig {
    pub fn new(url: impl Into<String>, embedding_dim: usize) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            timeout: Duration::from_secs(10),
            embedding_dim,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    vector: Vec<f32>,
}

/// Client for an external vectorization service.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    http: reqwest::Client,
    config: HttpEmbedderConfig,
}

impl HttpEmbedder {
    pub fn new(config: HttpEmbedderConfig) -> Result<Self, EmbeddingError> {
        if config.url.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "embedding service URL is empty".to_string(),
            });
        }
        if config.embedding_dim == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "embedding dimension cannot be zero".to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbeddingError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self { http, config })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        validate_input(text)?;

        let mut request = self.http.post(&self.config.url).json(&EmbedRequest { text });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EmbeddingError::Unavailable {
                url: self.config.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::BadStatus {
                status: status.as_u16(),
            });
        }

        let body: EmbedResponse =
            response
                .json()
                .await
                .map_err(|e| EmbeddingError::MalformedResponse {
                    reason: e.to_string(),
                })?;

        validate_embedding_dim(body.vector.len(), self.config.embedding_dim).map_err(|_| {
            EmbeddingError::DimensionMismatch {
                expected: self.config.embedding_dim,
                actual: body.vector.len(),
            }
        })?;

        debug!(dim = body.vector.len(), "Embedding received");
        Ok(body.vector)
    }

    fn embedding_dim(&self) -> usize {
        self.config.embedding_dim
    }
}
