//! Fast web-search provider (Brave Search API).
//!
//! `GET {endpoint}?q=..&count=..&result_filter=web,news` with the key in
//! `X-Subscription-Token`. Results come back nested under `web.results` and
//! `news.results`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{QueryLimits, SearchError, SearchProvider, SearchResult};

pub const BRAVE_PROVIDER_ID: &str = "brave";
pub const BRAVE_MAX_QUERY_CHARS: usize = 400;
pub const BRAVE_MAX_QUERY_WORDS: usize = 50;
/// The API refuses larger pages.
const BRAVE_MAX_COUNT: usize = 20;

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveSection>,
    #[serde(default)]
    news: Option<BraveSection>,
}

#[derive(Debug, Deserialize)]
struct BraveSection {
    #[serde(default)]
    results: Vec<BraveHit>,
}

#[derive(Debug, Deserialize)]
struct BraveHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

pub struct BraveProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl BraveProvider {
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
impl SearchProvider for BraveProvider {
    fn id(&self) -> &str {
        BRAVE_PROVIDER_ID
    }

    fn label(&self) -> &str {
        "Brave"
    }

    fn limits(&self) -> QueryLimits {
        QueryLimits::new(Some(BRAVE_MAX_QUERY_CHARS), Some(BRAVE_MAX_QUERY_WORDS))
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
        let count = max_results.clamp(1, BRAVE_MAX_COUNT).to_string();

        let response = self
            .http
            .get(&self.endpoint)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[
                ("q", query),
                ("count", count.as_str()),
                ("result_filter", "web,news"),
                ("safesearch", "moderate"),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Request {
                provider: BRAVE_PROVIDER_ID.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::HttpStatus {
                provider: BRAVE_PROVIDER_ID.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| SearchError::Request {
            provider: BRAVE_PROVIDER_ID.to_string(),
            reason: e.to_string(),
        })?;

        let mut results = parse_brave_response(&body)?;
        results.truncate(max_results);
        debug!(count = results.len(), "brave returned results");
        Ok(results)
    }
}

/// Flattens `web` then `news` hits, dropping entries without a URL.
pub(crate) fn parse_brave_response(body: &str) -> Result<Vec<SearchResult>, SearchError> {
    let parsed: BraveResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Malformed {
            provider: BRAVE_PROVIDER_ID.to_string(),
            reason: e.to_string(),
        })?;

    Ok([parsed.web, parsed.news]
        .into_iter()
        .flatten()
        .flat_map(|section| section.results)
        .filter(|hit| !hit.url.trim().is_empty())
        .map(|hit| SearchResult {
            title: strip_tags(&hit.title),
            url: hit.url,
            snippet: strip_tags(&hit.description),
        })
        .collect())
}

/// Removes inline markup such as `<strong>` that Brave puts in snippets.
pub(crate) fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
