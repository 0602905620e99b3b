use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::{JobConfig, JobTrigger, VerificationReport, render_evidence};
use crate::dedup::ClaimDeduplicator;
use crate::error::{PipelineError, PipelineResult};
use crate::search::{ProviderHint, SearchAggregator};
use crate::store::{JobStatus, Store};
use crate::verdict::{VerdictGenerator, VerdictLabel};

/// Result of [`JobOrchestrator::submit`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// A verdict for this claim (or its canonical form) already exists.
    Cache { query: String, result: Value },
    /// A new job was created and triggered.
    Queued { job_id: Uuid },
}

/// Read-only view of a job for pollers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatusView {
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// What a `process` call did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProcessOutcome {
    Completed { verdict: VerdictLabel },
    Failed { message: String },
    /// Another caller already moved the job out of `pending`.
    AlreadyClaimed { status: JobStatus },
}

/// A run whose job has been marked `completed`.
struct FinishedRun {
    report: VerificationReport,
    payload: Value,
    canonical: String,
}

/// Owns the job lifecycle: `pending → processing → completed | failed`.
pub struct JobOrchestrator {
    store: Arc<dyn Store>,
    search: Arc<SearchAggregator>,
    verdicts: Arc<dyn VerdictGenerator>,
    dedup: Arc<ClaimDeduplicator>,
    trigger: Arc<dyn JobTrigger>,
    config: JobConfig,
}

impl JobOrchestrator {
    pub fn new(
        store: Arc<dyn Store>,
        search: Arc<SearchAggregator>,
        verdicts: Arc<dyn VerdictGenerator>,
        dedup: Arc<ClaimDeduplicator>,
        trigger: Arc<dyn JobTrigger>,
        config: JobConfig,
    ) -> Self {
        Self {
            store,
            search,
            verdicts,
            dedup,
            trigger,
            config,
        }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Returns a cached verdict or queues a new job. Never waits for verification.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn submit(&self, query: &str) -> PipelineResult<SubmitOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PipelineError::Validation(
                "query must not be empty".to_string(),
            ));
        }
        let len = query.chars().count();
        if len > self.config.max_query_chars {
            return Err(PipelineError::Validation(format!(
                "query is {len} characters; the limit is {}",
                self.config.max_query_chars
            )));
        }

        let canonical = self.dedup.canonicalize(query).await;

        if let Err(e) = self.store.increment_search_count(&canonical).await {
            warn!(error = %e, "failed to record search count");
        }

        if let Some(result) = self.cached_result(query, &canonical).await? {
            debug!(%canonical, "serving cached verdict");
            return Ok(SubmitOutcome::Cache {
                query: canonical,
                result,
            });
        }

        let job = self.store.create_job(query).await?;
        if let Err(e) = self.trigger.trigger(job.id) {
            warn!(job_id = %job.id, error = %e, "trigger delivery failed; job stays pending");
        }

        info!(job_id = %job.id, "verification job queued");
        Ok(SubmitOutcome::Queued { job_id: job.id })
    }

    pub async fn get_status(&self, job_id: Uuid) -> PipelineResult<JobStatusView> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("job {job_id}")))?;

        Ok(JobStatusView {
            status: job.status,
            result: job.result,
            error_message: job.error_message,
        })
    }

    /// Runs verification for one job.
    ///
    /// Safe to call more than once per job: only the caller that wins the
    /// `pending → processing` claim does any work.
    #[instrument(skip(self))]
    pub async fn process(&self, job_id: Uuid) -> PipelineResult<ProcessOutcome> {
        if !self.store.claim_job(job_id).await? {
            return match self.store.get_job(job_id).await? {
                Some(job) => {
                    debug!(status = %job.status, "job already claimed");
                    Ok(ProcessOutcome::AlreadyClaimed { status: job.status })
                }
                None => Err(PipelineError::NotFound(format!("job {job_id}"))),
            };
        }

        let run = match tokio::time::timeout(self.config.job_timeout, self.run(job_id)).await {
            Ok(run) => run,
            Err(_) => Err(PipelineError::UpstreamUnavailable(format!(
                "verification timed out after {}ms",
                self.config.job_timeout.as_millis()
            ))),
        };

        match run {
            Ok(finished) => {
                let report = &finished.report;
                info!(verdict = %report.verdict, search_engine = %report.search_engine, "job completed");
                self.publish(&finished).await;
                Ok(ProcessOutcome::Completed {
                    verdict: finished.report.verdict,
                })
            }
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "job failed");
                match self.store.fail_job(job_id, &message).await {
                    Ok(true) => {}
                    Ok(false) => warn!("job left processing state before it could be failed"),
                    Err(store_err) => error!(error = %store_err, "could not record job failure"),
                }
                Ok(ProcessOutcome::Failed { message })
            }
        }
    }

    /// Re-triggers jobs stuck in `pending`. Returns how many were re-queued.
    #[instrument(skip(self))]
    pub async fn redeliver_stale(&self) -> PipelineResult<usize> {
        let stale_after = TimeDelta::from_std(self.config.stale_after).unwrap_or(TimeDelta::MAX);
        let cutoff = Utc::now()
            .checked_sub_signed(stale_after)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let stale = self
            .store
            .stale_pending_jobs(cutoff, self.config.redelivery_batch)
            .await?;

        let mut redelivered = 0;
        for job in &stale {
            match self.trigger.trigger(job.id) {
                Ok(()) => redelivered += 1,
                Err(e) => {
                    warn!(job_id = %job.id, error = %e, "redelivery stopped");
                    break;
                }
            }
        }

        if redelivered > 0 {
            info!(redelivered, found = stale.len(), "re-triggered stale pending jobs");
        }
        Ok(redelivered)
    }

    async fn run(&self, job_id: Uuid) -> PipelineResult<FinishedRun> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("job {job_id}")))?;

        let evidence = self
            .search
            .search(
                &job.query,
                Some(self.config.evidence_results),
                &ProviderHint::Auto,
            )
            .await?;
        if evidence.is_synthetic {
            warn!("verifying against placeholder evidence");
        }

        let verdict = self
            .verdicts
            .generate(&job.query, &render_evidence(&evidence.results))
            .await?;

        let report = VerificationReport::new(verdict, &evidence, self.verdicts.is_mock());
        let payload = serde_json::to_value(&report)
            .map_err(|e| PipelineError::Persistence(format!("report serialization: {e}")))?;

        let canonical = self.dedup.canonicalize(&job.query).await;

        if !self.store.complete_job(job_id, payload.clone()).await? {
            return Err(PipelineError::Persistence(
                "job left processing state before completion".to_string(),
            ));
        }

        Ok(FinishedRun {
            report,
            payload,
            canonical,
        })
    }

    /// Caches the verdict and bumps counters for a job that is already `completed`.
    ///
    /// Runs outside the job timeout. Failures are logged; the job stays completed.
    async fn publish(&self, finished: &FinishedRun) {
        if let Err(e) = self
            .store
            .append_result(&finished.canonical, finished.payload.clone())
            .await
        {
            error!(canonical = %finished.canonical, error = %e, "failed to cache verdict");
        }

        if finished.report.verdict.is_misinformation()
            && let Err(e) = self
                .store
                .increment_misinformation_count(&finished.canonical, finished.report.danger_level)
                .await
        {
            warn!(error = %e, "failed to record misinformation count");
        }
    }

    async fn cached_result(&self, query: &str, canonical: &str) -> PipelineResult<Option<Value>> {
        if let Some(hit) = self.store.latest_result(query).await? {
            return Ok(Some(hit.result));
        }
        if canonical != query
            && let Some(hit) = self.store.latest_result(canonical).await?
        {
            return Ok(Some(hit.result));
        }
        Ok(None)
    }
}
