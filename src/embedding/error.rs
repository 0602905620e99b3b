use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding input is empty")]
    EmptyInput,

    #[error("embedding service unreachable at '{url}': {reason}")]
    Unavailable { url: String, reason: String },

    #[error("embedding service returned HTTP {status}")]
    BadStatus { status: u16 },

    #[error("malformed embedding response: {reason}")]
    MalformedResponse { reason: String },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid embedding configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl EmbeddingError {
    /// True when the caller sent bad input rather than the collaborator misbehaving.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyInput)
    }
}
