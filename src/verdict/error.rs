use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerdictError {
    /// The language model could not be reached or refused the request.
    #[error("verdict generator unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("verdict generation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The model answered but not with a readable verdict.
    #[error("malformed verdict response: {reason}")]
    MalformedResponse { reason: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
}
