use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::SearchError;

/// One piece of evidence returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, url: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

/// Which providers a search may use.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProviderHint {
    /// Cascade through providers in precedence order.
    #[default]
    Auto,
    /// Query every provider concurrently and merge.
    Combined,
    /// Only this provider; its failure is reported to the caller.
    Pinned(String),
}

impl FromStr for ProviderHint {
    type Err = SearchError;

    /// Parses `auto`, `combined`, or a provider id. Blank means `auto`.
    ///
    /// Whether a pinned id exists is checked by the aggregator.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        match value.as_str() {
            "" | "auto" => Ok(Self::Auto),
            "combined" => Ok(Self::Combined),
            id if id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') => {
                Ok(Self::Pinned(id.to_string()))
            }
            _ => Err(SearchError::UnknownProvider(s.trim().to_string())),
        }
    }
}

impl fmt::Display for ProviderHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Combined => f.write_str("combined"),
            Self::Pinned(id) => f.write_str(id),
        }
    }
}

/// Input-size limits a provider enforces on the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryLimits {
    pub max_chars: Option<usize>,
    pub max_words: Option<usize>,
}

impl QueryLimits {
    pub const fn unlimited() -> Self {
        Self {
            max_chars: None,
            max_words: None,
        }
    }

    pub const fn new(max_chars: Option<usize>, max_words: Option<usize>) -> Self {
        Self {
            max_chars,
            max_words,
        }
    }

    pub fn exceeded_by(&self, query: &str) -> bool {
        let too_long = self
            .max_chars
            .is_some_and(|max| query.chars().count() > max);
        let too_wordy = self
            .max_words
            .is_some_and(|max| query.split_whitespace().count() > max);
        too_long || too_wordy
    }

    /// Cuts `query` down to fit, dropping whole words from the end.
    pub fn fit(&self, query: &str) -> String {
        let mut words: Vec<&str> = query.split_whitespace().collect();
        if let Some(max) = self.max_words {
            words.truncate(max);
        }

        let mut out = words.join(" ");
        if let Some(max) = self.max_chars {
            while out.chars().count() > max {
                match out.rfind(' ') {
                    Some(idx) => out.truncate(idx),
                    None => {
                        out = out.chars().take(max).collect();
                    }
                }
            }
        }
        out
    }
}

/// What a search produced and how.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    /// The query sent to the contributing provider was the simplified form.
    pub used_simplified_query: bool,
    /// The untouched caller query, present whenever a simplified form was used.
    pub original_query: Option<String>,
    pub simplified_query: Option<String>,
    /// Display label of the provider(s) that contributed, e.g. `Brave + Tavily`.
    pub provider_label: String,
    /// Results are a manufactured outage placeholder.
    pub is_synthetic: bool,
}
