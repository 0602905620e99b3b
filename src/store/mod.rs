//! Relational persistence: jobs, cached verdicts and claim counters.
//!
//! Components hold an `Arc<dyn Store>` handed to them at construction. [`MemoryStore`] keeps
//! everything in process memory; [`PgStore`] talks to Postgres.
//!
//! Expected Postgres tables (schema management lives outside this crate):
//!
//! - `jobs(id uuid pk, query text, status text, result jsonb, error_message text,
//!   created_at timestamptz, updated_at timestamptz)`
//! - `cached_results(id bigserial pk, query text, result jsonb, created_at timestamptz)`
//! - `search_counts(query text pk, count bigint)`
//! - `misinformation_counts(query text pk, count bigint, danger_level text)`

mod error;
pub mod memory;
pub mod model;
pub mod postgres;


use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use model::{
    CachedResult, DangerLevel, Job, JobStatus, MisinformationCounter, SearchCounter,
};
pub use postgres::PgStore;

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Inserts a new `pending` job.
    async fn create_job(&self, query: &str) -> StoreResult<Job>;

    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>>;

    /// Compare-and-swap `pending → processing`. Exactly one caller gets `true`.
    async fn claim_job(&self, id: Uuid) -> StoreResult<bool>;

    /// `processing → completed`. Returns `false` if the job was not processing.
    async fn complete_job(&self, id: Uuid, result: Value) -> StoreResult<bool>;

    /// Non-terminal → `failed`. Returns `false` if the job was already terminal or unknown.
    async fn fail_job(&self, id: Uuid, message: &str) -> StoreResult<bool>;

    /// Pending jobs not touched since `older_than`, oldest first.
    async fn stale_pending_jobs(
        &self,
        older_than: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<Job>>;

    /// Cheap reachability probe.
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
pub trait ResultCacheStore: Send + Sync {
    /// Most recent cached verdict for `query`.
    async fn latest_result(&self, query: &str) -> StoreResult<Option<CachedResult>>;

    async fn append_result(&self, query: &str, result: Value) -> StoreResult<()>;
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn search_count(&self, query: &str) -> StoreResult<Option<i64>>;

    async fn misinformation_count(&self, query: &str) -> StoreResult<Option<i64>>;

    /// Atomic `+1`, creating the row at 1. Returns the new count.
    async fn increment_search_count(&self, query: &str) -> StoreResult<i64>;

    /// Atomic `+1`. A provided danger level replaces the stored one.
    async fn increment_misinformation_count(
        &self,
        query: &str,
        danger_level: Option<DangerLevel>,
    ) -> StoreResult<i64>;

    /// Highest counts first, ties by text.
    async fn top_search_counts(&self, limit: usize) -> StoreResult<Vec<SearchCounter>>;

    async fn top_misinformation_counts(
        &self,
        limit: usize,
    ) -> StoreResult<Vec<MisinformationCounter>>;
}

/// Everything the pipeline persists.
pub trait Store: JobStore + ResultCacheStore + CounterStore {
    /// Short backend name for readiness output.
    fn backend(&self) -> &'static str;
}
