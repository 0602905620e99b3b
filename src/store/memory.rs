use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use super::{
    CachedResult, CounterStore, DangerLevel, Job, JobStatus, JobStore, MisinformationCounter,
    ResultCacheStore, SearchCounter, Store, StoreResult,
};

#[derive(Debug, Default)]
struct MemoryState {
    jobs: HashMap<Uuid, Job>,
    cached: Vec<CachedResult>,
    search_counts: HashMap<String, i64>,
    misinformation: HashMap<String, (i64, Option<DangerLevel>)>,
}

/// In-process store. Every method takes one lock, so each call is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites a counter; for seeding fixtures.
    pub fn set_search_count(&self, query: &str, count: i64) {
        self.state
            .write()
            .search_counts
            .insert(query.to_string(), count);
    }

    /// Overwrites a misinformation counter; for seeding fixtures.
    pub fn set_misinformation_count(
        &self,
        query: &str,
        count: i64,
        danger_level: Option<DangerLevel>,
    ) {
        self.state
            .write()
            .misinformation
            .insert(query.to_string(), (count, danger_level));
    }

    pub fn job_count(&self) -> usize {
        self.state.read().jobs.len()
    }
}

trait Ranked {
    fn count(&self) -> i64;
    fn query(&self) -> &str;
}

impl Ranked for SearchCounter {
    fn count(&self) -> i64 {
        self.count
    }
    fn query(&self) -> &str {
        &self.query
    }
}

impl Ranked for MisinformationCounter {
    fn count(&self) -> i64 {
        self.count
    }
    fn query(&self) -> &str {
        &self.query
    }
}

fn top_by_count<T: Ranked>(mut rows: Vec<T>, limit: usize) -> Vec<T> {
    rows.sort_by(|a, b| {
        b.count()
            .cmp(&a.count())
            .then_with(|| a.query().cmp(b.query()))
    });
    rows.truncate(limit);
    rows
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create_job(&self, query: &str) -> StoreResult<Job> {
        let job = Job::new_pending(query);
        self.state.write().jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        Ok(self.state.read().jobs.get(&id).cloned())
    }

    async fn claim_job(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write();
        match state.jobs.get_mut(&id) {
            Some(job) if job.status == JobStatus::Pending => {
                job.status = JobStatus::Processing;
                job.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete_job(&self, id: Uuid, result: Value) -> StoreResult<bool> {
        let mut state = self.state.write();
        match state.jobs.get_mut(&id) {
            Some(job) if job.status == JobStatus::Processing => {
                job.status = JobStatus::Completed;
                job.result = Some(result);
                job.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn fail_job(&self, id: Uuid, message: &str) -> StoreResult<bool> {
        let mut state = self.state.write();
        match state.jobs.get_mut(&id) {
            Some(job) if !job.status.is_terminal() => {
                job.status = JobStatus::Failed;
                job.error_message = Some(message.to_string());
                job.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn stale_pending_jobs(
        &self,
        older_than: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<Job>> {
        let mut stale: Vec<Job> = self
            .state
            .read()
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::Pending && job.updated_at < older_than)
            .cloned()
            .collect();
        stale.sort_by_key(|job| job.created_at);
        stale.truncate(limit);
        Ok(stale)
    }
}

#[async_trait]
impl ResultCacheStore for MemoryStore {
    async fn latest_result(&self, query: &str) -> StoreResult<Option<CachedResult>> {
        // Rows are appended in time order; the last match is the newest.
        Ok(self
            .state
            .read()
            .cached
            .iter()
            .rev()
            .find(|row| row.query == query)
            .cloned())
    }

    async fn append_result(&self, query: &str, result: Value) -> StoreResult<()> {
        self.state.write().cached.push(CachedResult {
            query: query.to_string(),
            result,
            created_at: Utc::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn search_count(&self, query: &str) -> StoreResult<Option<i64>> {
        Ok(self.state.read().search_counts.get(query).copied())
    }

    async fn misinformation_count(&self, query: &str) -> StoreResult<Option<i64>> {
        Ok(self
            .state
            .read()
            .misinformation
            .get(query)
            .map(|(count, _)| *count))
    }

    async fn increment_search_count(&self, query: &str) -> StoreResult<i64> {
        let mut state = self.state.write();
        let count = state.search_counts.entry(query.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn increment_misinformation_count(
        &self,
        query: &str,
        danger_level: Option<DangerLevel>,
    ) -> StoreResult<i64> {
        let mut state = self.state.write();
        let entry = state
            .misinformation
            .entry(query.to_string())
            .or_insert((0, None));
        entry.0 += 1;
        if danger_level.is_some() {
            entry.1 = danger_level;
        }
        Ok(entry.0)
    }

    async fn top_search_counts(&self, limit: usize) -> StoreResult<Vec<SearchCounter>> {
        let rows: Vec<SearchCounter> = self
            .state
            .read()
            .search_counts
            .iter()
            .map(|(query, count)| SearchCounter {
                query: query.clone(),
                count: *count,
            })
            .collect();
        Ok(top_by_count(rows, limit))
    }

    async fn top_misinformation_counts(
        &self,
        limit: usize,
    ) -> StoreResult<Vec<MisinformationCounter>> {
        let rows: Vec<MisinformationCounter> = self
            .state
            .read()
            .misinformation
            .iter()
            .map(|(query, (count, danger_level))| MisinformationCounter {
                query: query.clone(),
                count: *count,
                danger_level: *danger_level,
            })
            .collect();
        Ok(top_by_count(rows, limit))
    }
}

impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }
}
