//! Verity library crate (used by the server and integration tests).
//!
//! # Public API Surface
//!
//! The pipeline turns a free-text claim into a verdict backed by web evidence. The exports
//! are organized by stage:
//!
//! ## Jobs
//! - [`JobOrchestrator`] - submit, status, process and redelivery of verification jobs
//! - [`JobQueue`], [`JobWorker`], [`RedeliverySweeper`] - in-process delivery
//!
//! ## Evidence & Verdicts
//! - [`SearchAggregator`] - provider cascade, pinned and combined search
//! - [`simplify`] - keyword reduction for providers with input limits
//! - [`VerdictGenerator`], [`GenaiVerdictGenerator`] - verdicts from evidence
//!
//! ## Similarity
//! - [`Embedder`], [`HttpEmbedder`], [`StubEmbedder`] - embedding adapter
//! - [`ClaimIndex`], [`QdrantClaimIndex`], [`MemoryClaimIndex`] - claim vector index
//! - [`ClaimDeduplicator`] - representative claim selection
//! - [`AnalyticsService`] - clustered top-searched and top-misinformation lists
//!
//! ## Persistence
//! - [`Store`], [`PgStore`], [`MemoryStore`] - jobs, cached results and counters
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod analytics;
pub mod config;
pub mod constants;
pub mod dedup;
pub mod embedding;
pub mod error;
pub mod hashing;
pub mod jobs;
pub mod search;
pub mod simplify;
pub mod store;
pub mod vectordb;
pub mod verdict;

pub use analytics::{
    AnalyticsConfig, AnalyticsService, ClaimCluster, ClaimMetadata, ClusterCandidate,
    ClusterThresholds, ThresholdError, TopItem, TopListKind, build_top_list,
};
pub use config::{Config, ConfigError};
pub use constants::{
    DimConfig, DimValidationError, VERITY_STATUS_ERROR, VERITY_STATUS_HEADER,
    VERITY_STATUS_HEALTHY, VERITY_STATUS_NOT_READY, VERITY_STATUS_READY, validate_embedding_dim,
};
pub use dedup::{ClaimDeduplicator, DedupConfig, DedupError, SimilarityLookup};
pub use embedding::{Embedder, EmbeddingError, HttpEmbedder, HttpEmbedderConfig, StubEmbedder};
#[cfg(any(test, feature = "mock"))]
pub use embedding::FixtureEmbedder;
pub use error::{PipelineError, PipelineResult};
pub use hashing::{claim_point_id, hash_to_u64};
pub use jobs::{
    JobConfig, JobOrchestrator, JobQueue, JobReceiver, JobStatusView, JobTrigger, JobWorker,
    ProcessOutcome, RedeliverySweeper, SubmitOutcome, TriggerError, VerificationReport,
};
pub use search::{
    ProviderHint, SearchAggregator, SearchConfig, SearchError, SearchOutcome, SearchProvider,
    SearchResult,
};
#[cfg(any(test, feature = "mock"))]
pub use search::{ScriptStep, ScriptedProvider};
pub use simplify::{simplified_form, simplify};
pub use store::{
    CachedResult, CounterStore, DangerLevel, Job, JobStatus, JobStore, MemoryStore, PgStore,
    ResultCacheStore, Store, StoreError,
};
pub use vectordb::{ClaimIndex, ClaimIndexError, MemoryClaimIndex, QdrantClaimIndex, SimilarClaim};
#[cfg(any(test, feature = "mock"))]
pub use vectordb::FailingClaimIndex;
pub use verdict::{
    GenaiVerdictGenerator, MockVerdictGenerator, Verdict, VerdictConfig, VerdictError,
    VerdictGenerator, VerdictLabel,
};
