//! Provider cascade with graceful degradation.
//!
//! - `auto`: try providers in precedence order; errors, timeouts and empty answers fall
//!   through to the next provider.
//! - `combined`: query all providers concurrently, merge, drop duplicate URLs.
//! - pinned: one provider, and its failure is the caller's failure.
//!
//! When nothing produces results the aggregator returns a single synthetic placeholder
//! instead of an empty list, so evidence consumers always have something to read.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, info, instrument, warn};

use super::brave::BraveProvider;
use super::tavily::TavilyProvider;
use super::url_normalize::normalize_url;
use super::{
    ProviderHint, SearchConfig, SearchError, SearchOutcome, SearchProvider, SearchResult,
};
use crate::simplify::simplified_form;

/// Label attached to placeholder output.
pub const SYNTHETIC_PROVIDER_LABEL: &str = "Mock";

/// What one provider produced for one query, after any simplification and retry.
struct Attempt {
    results: Vec<SearchResult>,
    /// Query actually sent when it differs from the caller's.
    simplified: Option<String>,
}

pub struct SearchAggregator {
    providers: Vec<Arc<dyn SearchProvider>>,
    config: SearchConfig,
}

impl SearchAggregator {
    /// Providers are consulted in the order given.
    pub fn new(
        providers: Vec<Arc<dyn SearchProvider>>,
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        config.validate()?;

        let mut ids = HashSet::new();
        for provider in &providers {
            if !ids.insert(provider.id().to_ascii_lowercase()) {
                return Err(SearchError::Config(format!(
                    "duplicate provider id '{}'",
                    provider.id()
                )));
            }
        }

        Ok(Self { providers, config })
    }

    /// Registers every provider that has an API key, fast provider first.
    pub fn from_config(config: SearchConfig) -> Result<Self, SearchError> {
        let mut providers: Vec<Arc<dyn SearchProvider>> = Vec::new();

        match &config.brave_api_key {
            Some(key) => providers.push(Arc::new(BraveProvider::new(
                &config.brave_url,
                key,
                config.brave_timeout,
            )?)),
            None => warn!("VERITY_BRAVE_API_KEY not set; web-search provider disabled"),
        }

        match &config.tavily_api_key {
            Some(key) => providers.push(Arc::new(TavilyProvider::new(
                &config.tavily_url,
                key,
                config.tavily_timeout,
            )?)),
            None => warn!("VERITY_TAVILY_API_KEY not set; crawl provider disabled"),
        }

        if providers.is_empty() {
            warn!("No search providers configured; every search degrades to a placeholder");
        } else {
            info!(
                providers = ?providers.iter().map(|p| p.id()).collect::<Vec<_>>(),
                "Search providers registered"
            );
        }

        Self::new(providers, config)
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn provider_ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Longest single-call bound across providers.
    pub fn max_provider_timeout(&self) -> Option<Duration> {
        self.providers.iter().map(|p| p.timeout()).max()
    }

    /// Searches for evidence. `max_results` defaults and is clamped per [`SearchConfig`].
    ///
    /// Only a pinned provider's failure, an unknown pinned id, or an empty query produce an
    /// error.
    #[instrument(skip(self, query), fields(query_len = query.len(), hint = %hint))]
    pub async fn search(
        &self,
        query: &str,
        max_results: Option<usize>,
        hint: &ProviderHint,
    ) -> Result<SearchOutcome, SearchError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(SearchError::InvalidRequest(
                "query must not be empty".to_string(),
            ));
        }
        let max_results = self.config.clamp_max_results(max_results);

        let mut outcome = match hint {
            ProviderHint::Auto => self.search_cascade(trimmed, max_results).await,
            ProviderHint::Combined => self.search_combined(trimmed, max_results).await,
            ProviderHint::Pinned(id) => self.search_pinned(id, trimmed, max_results).await?,
        };
        // Reported exactly as the caller sent it, surrounding whitespace included.
        outcome.original_query = outcome.used_simplified_query.then(|| query.to_string());
        Ok(outcome)
    }

    async fn search_cascade(&self, query: &str, max_results: usize) -> SearchOutcome {
        for provider in &self.providers {
            match self.attempt(provider.as_ref(), query, max_results).await {
                Ok(attempt) if !attempt.results.is_empty() => {
                    return build_outcome(provider.label().to_string(), attempt, max_results);
                }
                Ok(_) => {
                    debug!(provider = provider.id(), "provider returned no results, falling back");
                }
                Err(e) => {
                    warn!(provider = provider.id(), error = %e, "provider failed, falling back");
                }
            }
        }

        warn!("all search providers exhausted, substituting placeholder");
        synthetic_outcome(query)
    }

    async fn search_combined(&self, query: &str, max_results: usize) -> SearchOutcome {
        let attempts = join_all(self.providers.iter().map(|provider| async move {
            let outcome = self.attempt(provider.as_ref(), query, max_results).await;
            (provider, outcome)
        }))
        .await;

        // (provider index, result), in provider precedence order
        let mut merged: Vec<(usize, SearchResult)> = Vec::new();
        let mut seen_urls = HashSet::new();
        let mut simplified: Vec<Option<String>> = vec![None; self.providers.len()];

        for (index, (provider, outcome)) in attempts.into_iter().enumerate() {
            match outcome {
                Ok(attempt) => {
                    debug!(
                        provider = provider.id(),
                        count = attempt.results.len(),
                        "provider returned results"
                    );
                    simplified[index] = attempt.simplified;
                    for result in attempt.results {
                        if seen_urls.insert(normalize_url(&result.url)) {
                            merged.push((index, result));
                        }
                    }
                }
                Err(e) => {
                    warn!(provider = provider.id(), error = %e, "provider failed in combined search");
                }
            }
        }

        if merged.is_empty() {
            warn!("no provider contributed to combined search, substituting placeholder");
            return synthetic_outcome(query);
        }

        merged.truncate(max_results);

        let mut contributors: Vec<usize> = merged.iter().map(|(index, _)| *index).collect();
        contributors.dedup();

        let label = contributors
            .iter()
            .map(|&index| self.providers[index].label())
            .collect::<Vec<_>>()
            .join(" + ");
        let simplified_query = contributors
            .iter()
            .find_map(|&index| simplified[index].clone());

        SearchOutcome {
            results: merged.into_iter().map(|(_, result)| result).collect(),
            used_simplified_query: simplified_query.is_some(),
            original_query: None,
            simplified_query,
            provider_label: label,
            is_synthetic: false,
        }
    }

    async fn search_pinned(
        &self,
        id: &str,
        query: &str,
        max_results: usize,
    ) -> Result<SearchOutcome, SearchError> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.id().eq_ignore_ascii_case(id))
            .ok_or_else(|| SearchError::UnknownProvider(id.to_string()))?;

        let attempt = self.attempt(provider.as_ref(), query, max_results).await?;
        Ok(build_outcome(
            provider.label().to_string(),
            attempt,
            max_results,
        ))
    }

    /// One provider, with overflow simplification and the single zero-result retry.
    async fn attempt(
        &self,
        provider: &dyn SearchProvider,
        query: &str,
        max_results: usize,
    ) -> Result<Attempt, SearchError> {
        let limits = provider.limits();

        let simplified = if limits.exceeded_by(query) {
            let short = simplified_form(query)
                .map(|s| limits.fit(&s))
                .unwrap_or_else(|| limits.fit(query));
            debug!(
                provider = provider.id(),
                original_len = query.chars().count(),
                simplified = %short,
                "query exceeds provider limits, simplifying"
            );
            (short != query).then_some(short)
        } else {
            None
        };

        let sent = simplified.as_deref().unwrap_or(query);
        let results = self.call(provider, sent, max_results).await?;

        if !results.is_empty() || simplified.is_some() {
            return Ok(Attempt {
                results,
                simplified,
            });
        }

        match simplified_form(query) {
            Some(short) => {
                debug!(
                    provider = provider.id(),
                    simplified = %short,
                    "no results, retrying once with simplified query"
                );
                let results = self.call(provider, &short, max_results).await?;
                Ok(Attempt {
                    results,
                    simplified: Some(short),
                })
            }
            None => Ok(Attempt {
                results,
                simplified: None,
            }),
        }
    }

    async fn call(
        &self,
        provider: &dyn SearchProvider,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let timeout = provider.timeout();
        match tokio::time::timeout(timeout, provider.search(query, max_results)).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout {
                provider: provider.id().to_string(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

fn build_outcome(
    label: String,
    attempt: Attempt,
    max_results: usize,
) -> SearchOutcome {
    let mut results = attempt.results;
    results.truncate(max_results);

    SearchOutcome {
        results,
        used_simplified_query: attempt.simplified.is_some(),
        original_query: None,
        simplified_query: attempt.simplified,
        provider_label: label,
        is_synthetic: false,
    }
}

fn synthetic_outcome(query: &str) -> SearchOutcome {
    SearchOutcome {
        results: vec![SearchResult {
            title: "Live search unavailable".to_string(),
            url: String::new(),
            snippet: format!(
                "No search provider returned results for \"{query}\". Live evidence was \
                 unavailable at verification time; treat any verdict as unverified."
            ),
        }],
        used_simplified_query: false,
        original_query: None,
        simplified_query: None,
        provider_label: SYNTHETIC_PROVIDER_LABEL.to_string(),
        is_synthetic: true,
    }
}
