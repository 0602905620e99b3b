//! Crawl-style provider (Tavily).
//!
//! `POST {endpoint}` with `{query, max_results}`; answers `{results: [{title, url, content}]}`.
//! Slower than the web-search provider but with better recall on long queries.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{QueryLimits, SearchError, SearchProvider, SearchResult};

pub const TAVILY_PROVIDER_ID: &str = "tavily";
pub const TAVILY_MAX_QUERY_CHARS: usize = 400;

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyHit>,
}

#[derive(Debug, Deserialize)]
struct TavilyHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

pub struct TavilyProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl TavilyProvider {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Config(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout,
        })
    }
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    fn id(&self) -> &str {
        TAVILY_PROVIDER_ID
    }

    fn label(&self) -> &str {
        "Tavily"
    }

    fn limits(&self) -> QueryLimits {
        QueryLimits::new(Some(TAVILY_MAX_QUERY_CHARS), None)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    #[instrument(skip(self, query), fields(query_len = query.len()))]
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&TavilyRequest { query, max_results })
            .send()
            .await
            .map_err(|e| SearchError::Request {
                provider: TAVILY_PROVIDER_ID.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::HttpStatus {
                provider: TAVILY_PROVIDER_ID.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| SearchError::Request {
            provider: TAVILY_PROVIDER_ID.to_string(),
            reason: e.to_string(),
        })?;

        let mut results = parse_tavily_response(&body)?;
        results.truncate(max_results);
        debug!(count = results.len(), "tavily returned results");
        Ok(results)
    }
}

pub(crate) fn parse_tavily_response(body: &str) -> Result<Vec<SearchResult>, SearchError> {
    let parsed: TavilyResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Malformed {
            provider: TAVILY_PROVIDER_ID.to_string(),
            reason: e.to_string(),
        })?;

    Ok(parsed
        .results
        .into_iter()
        .filter(|hit| !hit.url.trim().is_empty())
        .map(|hit| SearchResult {
            title: hit.title,
            url: hit.url,
            snippet: hit.content,
        })
        .collect())
}
