//! Search error types.
//!
//! Messages never include API keys.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Provider answered with a non-2xx status.
    #[error("provider '{provider}' returned HTTP {status}")]
    HttpStatus { provider: String, status: u16 },

    /// Transport-level failure reaching the provider.
    #[error("provider '{provider}' request failed: {reason}")]
    Request { provider: String, reason: String },

    /// Provider did not answer within its timeout.
    #[error("provider '{provider}' timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    /// Provider answered 2xx with a body we could not read.
    #[error("provider '{provider}' returned a malformed body: {reason}")]
    Malformed { provider: String, reason: String },

    /// A pinned provider id that is not registered.
    #[error("unknown search provider: {0}")]
    UnknownProvider(String),

    /// Empty query or similar caller mistake.
    #[error("invalid search request: {0}")]
    InvalidRequest(String),

    /// Invalid search configuration.
    #[error("search config error: {0}")]
    Config(String),
}

impl SearchError {
    /// True for errors caused by the caller rather than a provider.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::UnknownProvider(_) | Self::InvalidRequest(_))
    }
}
