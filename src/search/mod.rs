//! Multi-provider web search for claim evidence.
//!
//! [`SearchAggregator`] cascades across [`SearchProvider`]s, simplifies queries that
//! overflow a provider's input limits, retries once on an empty answer, and degrades to a
//! synthetic placeholder when every provider comes back empty-handed.

pub mod aggregator;
pub mod brave;
mod config;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod provider;
pub mod tavily;
mod types;
pub mod url_normalize;

#[cfg(test)]
mod tests;

pub use aggregator::{SYNTHETIC_PROVIDER_LABEL, SearchAggregator};
pub use brave::{BRAVE_PROVIDER_ID, BraveProvider};
pub use config::{DEFAULT_BRAVE_URL, DEFAULT_TAVILY_URL, SearchConfig};
pub use error::SearchError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{ScriptStep, ScriptedProvider, sample_results};
pub use provider::SearchProvider;
pub use tavily::{TAVILY_PROVIDER_ID, TavilyProvider};
pub use types::{ProviderHint, QueryLimits, SearchOutcome, SearchResult};
pub use url_normalize::normalize_url;
