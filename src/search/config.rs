//! Search provider configuration.
//!
//! A provider is registered only when its API key is set. Precedence for `auto` mode is
//! fixed: the fast web-search provider first, then the slower crawl-style provider.

use std::time::Duration;

use super::SearchError;
use crate::config::{ConfigError, millis_or, optional_string, parse_or, string_or};

pub const DEFAULT_BRAVE_URL: &str = "https://api.search.brave.com/res/v1/web/search";
pub const DEFAULT_TAVILY_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub brave_api_key: Option<String>,
    pub brave_url: String,
    /// Per-call bound for the fast provider. Default: 5s.
    pub brave_timeout: Duration,

    pub tavily_api_key: Option<String>,
    pub tavily_url: String,
    /// Per-call bound for the crawl-style provider. Default: 15s.
    pub tavily_timeout: Duration,

    /// Results requested when the caller does not say. Default: `5`.
    pub default_max_results: usize,
    /// Hard ceiling on `max_results`. Default: `20`.
    pub max_results_cap: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            brave_api_key: None,
            brave_url: DEFAULT_BRAVE_URL.to_string(),
            brave_timeout: Duration::from_secs(5),
            tavily_api_key: None,
            tavily_url: DEFAULT_TAVILY_URL.to_string(),
            tavily_timeout: Duration::from_secs(15),
            default_max_results: 5,
            max_results_cap: 20,
        }
    }
}

impl SearchConfig {
    const ENV_BRAVE_API_KEY: &'static str = "VERITY_BRAVE_API_KEY";
    const ENV_BRAVE_URL: &'static str = "VERITY_BRAVE_URL";
    const ENV_BRAVE_TIMEOUT_MS: &'static str = "VERITY_BRAVE_TIMEOUT_MS";
    const ENV_TAVILY_API_KEY: &'static str = "VERITY_TAVILY_API_KEY";
    const ENV_TAVILY_URL: &'static str = "VERITY_TAVILY_URL";
    const ENV_TAVILY_TIMEOUT_MS: &'static str = "VERITY_TAVILY_TIMEOUT_MS";
    const ENV_MAX_RESULTS: &'static str = "VERITY_SEARCH_MAX_RESULTS";
    const ENV_MAX_RESULTS_CAP: &'static str = "VERITY_SEARCH_MAX_RESULTS_CAP";

    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            brave_api_key: optional_string(Self::ENV_BRAVE_API_KEY),
            brave_url: string_or(Self::ENV_BRAVE_URL, defaults.brave_url),
            brave_timeout: millis_or(Self::ENV_BRAVE_TIMEOUT_MS, defaults.brave_timeout)?,
            tavily_api_key: optional_string(Self::ENV_TAVILY_API_KEY),
            tavily_url: string_or(Self::ENV_TAVILY_URL, defaults.tavily_url),
            tavily_timeout: millis_or(Self::ENV_TAVILY_TIMEOUT_MS, defaults.tavily_timeout)?,
            default_max_results: parse_or(Self::ENV_MAX_RESULTS, defaults.default_max_results)?,
            max_results_cap: parse_or(Self::ENV_MAX_RESULTS_CAP, defaults.max_results_cap)?,
        })
    }

    /// Checks:
    /// - both timeouts are non-zero
    /// - `max_results_cap` is non-zero
    /// - `default_max_results` is within `1..=max_results_cap`
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.brave_timeout.is_zero() || self.tavily_timeout.is_zero() {
            return Err(SearchError::Config(
                "provider timeouts must be greater than 0".into(),
            ));
        }
        if self.max_results_cap == 0 {
            return Err(SearchError::Config(
                "max_results_cap must be greater than 0".into(),
            ));
        }
        if self.default_max_results == 0 || self.default_max_results > self.max_results_cap {
            return Err(SearchError::Config(format!(
                "default_max_results must be in 1..={}",
                self.max_results_cap
            )));
        }
        Ok(())
    }

    /// Clamps a caller-supplied result count into `1..=max_results_cap`.
    pub fn clamp_max_results(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_max_results)
            .clamp(1, self.max_results_cap)
    }
}
