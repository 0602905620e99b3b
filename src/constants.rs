//! Cross-cutting, shared constants.
//!
//! Thresholds here are defaults for config fields; the `VERITY_*` overrides live next to the
//! component that reads them.
//!
//! # Dimension Invariants
//!
//! The embedding service, the stub embedder and the claim index must agree on one vector
//! dimension. Pass it around with [`DimConfig`] and check it with [`validate_embedding_dim`]
//! wherever a vector crosses a module boundary.

pub const VERITY_STATUS_HEADER: &str = "X-Verity-Status";
pub const VERITY_STATUS_HEALTHY: &str = "healthy";
pub const VERITY_STATUS_READY: &str = "ready";
pub const VERITY_STATUS_NOT_READY: &str = "not_ready";
pub const VERITY_STATUS_ERROR: &str = "error";

pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

pub const DEFAULT_VECTOR_SIZE_U64: u64 = DEFAULT_EMBEDDING_DIM as u64;

/// Minimum similarity for an indexed claim to be considered the same claim as new input.
pub const DEFAULT_REPRESENTATIVE_THRESHOLD: f32 = 0.80;

/// Similarity at which an analytics candidate may join an existing cluster.
pub const DEFAULT_CLUSTER_JOIN_THRESHOLD: f32 = 0.80;

/// Similarity at which an analytics candidate is folded into the current cluster outright.
pub const DEFAULT_CLUSTER_ABSORB_THRESHOLD: f32 = 0.85;

/// Upper bound on neighbours fetched per similarity lookup.
pub const DEFAULT_SIMILAR_MAX_RESULTS: usize = 10;

/// Upper bound on "similar claims" reported per analytics entry.
pub const MAX_SIMILAR_MEMBERS: usize = 5;

/// Upper bound on key terms kept by the query simplifier.
pub const MAX_SIMPLIFIED_TERMS: usize = 6;

/// Runtime dimension configuration for modules that support dynamic embedding sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimConfig {
    /// The embedding vector dimension (number of floats).
    pub embedding_dim: usize,
}

impl Default for DimConfig {
    fn default() -> Self {
        Self {
            embedding_dim: DEFAULT_EMBEDDING_DIM,
        }
    }
}

impl DimConfig {
    pub fn new(embedding_dim: usize) -> Self {
        Self { embedding_dim }
    }

    /// Rejects a zero dimension.
    pub fn validate(&self) -> Result<(), DimValidationError> {
        if self.embedding_dim == 0 {
            return Err(DimValidationError::ZeroDimension);
        }
        Ok(())
    }

    /// Vector size in the form Qdrant expects.
    pub fn vector_size(&self) -> u64 {
        self.embedding_dim as u64
    }
}

/// Error returned when dimension validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimValidationError {
    /// Embedding dimension cannot be zero.
    ZeroDimension,
    /// Runtime dimension does not match expected dimension.
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for DimValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "embedding dimension cannot be zero"),
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for DimValidationError {}

/// Validates that a runtime embedding dimension matches the expected dimension.
///
/// # Example
///
/// ```
/// use verity::constants::{validate_embedding_dim, DEFAULT_EMBEDDING_DIM};
///
/// let embedder_dim = 1536;
/// validate_embedding_dim(embedder_dim, DEFAULT_EMBEDDING_DIM).unwrap();
/// ```
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if actual != expected {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
