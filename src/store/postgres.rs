use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use uuid::Uuid;

use super::{
    CachedResult, CounterStore, DangerLevel, Job, JobStatus, JobStore, MisinformationCounter,
    ResultCacheStore, SearchCounter, Store, StoreError, StoreResult,
};

const JOB_COLUMNS: &str = "id, query, status, result, error_message, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    query: String,
    status: String,
    result: Option<Value>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status: JobStatus = row
            .status
            .parse()
            .map_err(|reason| StoreError::CorruptRow {
                table: "jobs",
                reason,
            })?;

        Ok(Job {
            id: row.id,
            query: row.query,
            status,
            result: row.result,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MisinformationRow {
    query: String,
    count: i64,
    danger_level: Option<String>,
}

impl From<MisinformationRow> for MisinformationCounter {
    fn from(row: MisinformationRow) -> Self {
        MisinformationCounter {
            query: row.query,
            count: row.count,
            // Unknown labels are dropped rather than failing the whole listing.
            danger_level: row.danger_level.and_then(|d| d.parse().ok()),
        }
    }
}

/// Postgres-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Unavailable {
                reason: e.to_string(),
            })?;

        info!(max_connections, "Connected to Postgres");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn clamp_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl JobStore for PgStore {
    async fn create_job(&self, query: &str) -> StoreResult<Job> {
        let job = Job::new_pending(query);

        sqlx::query(
            "INSERT INTO jobs (id, query, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)",
        )
        .bind(job.id)
        .bind(&job.query)
        .bind(job.status.as_str())
        .bind(job.created_at)
        .execute(&self.pool)
        .await?;

        Ok(job)
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Job::try_from).transpose()
    }

    async fn claim_job(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE jobs SET status = 'processing', updated_at = now()
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn complete_job(&self, id: Uuid, result: Value) -> StoreResult<bool> {
        let outcome = sqlx::query(
            "UPDATE jobs SET status = 'completed', result = $2, updated_at = now()
             WHERE id = $1 AND status = 'processing'",
        )
        .bind(id)
        .bind(result)
        .execute(&self.pool)
        .await?;

        Ok(outcome.rows_affected() == 1)
    }

    async fn fail_job(&self, id: Uuid, message: &str) -> StoreResult<bool> {
        let outcome = sqlx::query(
            "UPDATE jobs SET status = 'failed', error_message = $2, updated_at = now()
             WHERE id = $1 AND status IN ('pending', 'processing')",
        )
        .bind(id)
        .bind(message)
        .execute(&self.pool)
        .await?;

        Ok(outcome.rows_affected() == 1)
    }

    async fn stale_pending_jobs(
        &self,
        older_than: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs
             WHERE status = 'pending' AND updated_at < $1
             ORDER BY created_at
             LIMIT $2"
        ))
        .bind(older_than)
        .bind(clamp_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Job::try_from).collect()
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable {
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl ResultCacheStore for PgStore {
    async fn latest_result(&self, query: &str) -> StoreResult<Option<CachedResult>> {
        let row = sqlx::query_as::<_, (String, Value, DateTime<Utc>)>(
            "SELECT query, result, created_at FROM cached_results
             WHERE query = $1
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
        )
        .bind(query)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(query, result, created_at)| CachedResult {
            query,
            result,
            created_at,
        }))
    }

    async fn append_result(&self, query: &str, result: Value) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO cached_results (query, result, created_at) VALUES ($1, $2, now())",
        )
        .bind(query)
        .bind(result)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CounterStore for PgStore {
    async fn search_count(&self, query: &str) -> StoreResult<Option<i64>> {
        let count = sqlx::query_scalar::<_, i64>("SELECT count FROM search_counts WHERE query = $1")
            .bind(query)
            .fetch_optional(&self.pool)
            .await?;
        Ok(count)
    }

    async fn misinformation_count(&self, query: &str) -> StoreResult<Option<i64>> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT count FROM misinformation_counts WHERE query = $1",
        )
        .bind(query)
        .fetch_optional(&self.pool)
        .await?;
        Ok(count)
    }

    async fn increment_search_count(&self, query: &str) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "INSERT INTO search_counts (query, count) VALUES ($1, 1)
             ON CONFLICT (query) DO UPDATE SET count = search_counts.count + 1
             RETURNING count",
        )
        .bind(query)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn increment_misinformation_count(
        &self,
        query: &str,
        danger_level: Option<DangerLevel>,
    ) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "INSERT INTO misinformation_counts (query, count, danger_level) VALUES ($1, 1, $2)
             ON CONFLICT (query) DO UPDATE SET
                 count = misinformation_counts.count + 1,
                 danger_level = COALESCE(EXCLUDED.danger_level, misinformation_counts.danger_level)
             RETURNING count",
        )
        .bind(query)
        .bind(danger_level.map(|d| d.as_str()))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn top_search_counts(&self, limit: usize) -> StoreResult<Vec<SearchCounter>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT query, count FROM search_counts ORDER BY count DESC, query ASC LIMIT $1",
        )
        .bind(clamp_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(query, count)| SearchCounter { query, count })
            .collect())
    }

    async fn top_misinformation_counts(
        &self,
        limit: usize,
    ) -> StoreResult<Vec<MisinformationCounter>> {
        let rows = sqlx::query_as::<_, MisinformationRow>(
            "SELECT query, count, danger_level FROM misinformation_counts
             ORDER BY count DESC, query ASC
             LIMIT $1",
        )
        .bind(clamp_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MisinformationCounter::from).collect())
    }
}

impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }
}
