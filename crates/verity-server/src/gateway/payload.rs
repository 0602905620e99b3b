use serde::{Deserialize, Serialize};
use uuid::Uuid;

use verity::analytics::TopItem;
use verity::search::{SearchOutcome, SearchResult};

#[derive(Deserialize, Debug, Clone)]
pub struct ClaimRequest {
    pub query: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct QueuedResponse {
    pub job_id: Uuid,
}

#[derive(Serialize, Debug, Clone)]
pub struct CachedResponse {
    pub query: String,
    pub result: serde_json::Value,
    pub source: &'static str,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub max_results: Option<usize>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub content: String,
}

impl From<SearchResult> for SearchHit {
    fn from(result: SearchResult) -> Self {
        Self {
            title: result.title,
            url: result.url,
            content: result.snippet,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub search_engine: String,
    pub is_mock: bool,
    pub used_simplified_query: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simplified_query: Option<String>,
}

impl From<SearchOutcome> for SearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        Self {
            results: outcome.results.into_iter().map(SearchHit::from).collect(),
            search_engine: outcome.provider_label,
            is_mock: outcome.is_synthetic,
            used_simplified_query: outcome.used_simplified_query,
            original_query: outcome.original_query,
            simplified_query: outcome.simplified_query,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct TopListParams {
    pub limit: Option<usize>,
}

#[derive(Serialize, Debug, Clone)]
pub struct TopListResponse {
    pub items: Vec<TopItem>,
}
