use std::time::Duration;

use crate::config::{ConfigError, millis_or, parse_or, require_positive, secs_or};

#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Bound on one `process` run. Must exceed every provider timeout. Default: 120s.
    pub job_timeout: Duration,

    /// Jobs processed concurrently by the worker pool. Default: `4`.
    pub worker_concurrency: usize,

    /// Capacity of the trigger queue. Default: `1024`.
    pub queue_capacity: usize,

    /// How often the redelivery sweep runs. Default: 30s.
    pub redelivery_interval: Duration,

    /// A pending job untouched for this long is re-triggered. Default: 60s.
    pub stale_after: Duration,

    /// Jobs re-triggered per sweep. Default: `100`.
    pub redelivery_batch: usize,

    /// Longest accepted claim, in characters. Default: `2000`.
    pub max_query_chars: usize,

    /// Search results gathered as evidence. Default: `5`.
    pub evidence_results: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            job_timeout: Duration::from_secs(120),
            worker_concurrency: 4,
            queue_capacity: 1024,
            redelivery_interval: Duration::from_secs(30),
            stale_after: Duration::from_secs(60),
            redelivery_batch: 100,
            max_query_chars: 2000,
            evidence_results: 5,
        }
    }
}

impl JobConfig {
    const ENV_JOB_TIMEOUT_MS: &'static str = "VERITY_JOB_TIMEOUT_MS";
    const ENV_WORKER_CONCURRENCY: &'static str = "VERITY_WORKER_CONCURRENCY";
    const ENV_QUEUE_CAPACITY: &'static str = "VERITY_QUEUE_CAPACITY";
    const ENV_REDELIVERY_INTERVAL_SECS: &'static str = "VERITY_REDELIVERY_INTERVAL_SECS";
    const ENV_STALE_AFTER_SECS: &'static str = "VERITY_STALE_AFTER_SECS";
    const ENV_REDELIVERY_BATCH: &'static str = "VERITY_REDELIVERY_BATCH";
    const ENV_MAX_QUERY_CHARS: &'static str = "VERITY_MAX_QUERY_CHARS";
    const ENV_EVIDENCE_RESULTS: &'static str = "VERITY_EVIDENCE_RESULTS";

    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            job_timeout: millis_or(Self::ENV_JOB_TIMEOUT_MS, defaults.job_timeout)?,
            worker_concurrency: parse_or(
                Self::ENV_WORKER_CONCURRENCY,
                defaults.worker_concurrency,
            )?,
            queue_capacity: parse_or(Self::ENV_QUEUE_CAPACITY, defaults.queue_capacity)?,
            redelivery_interval: secs_or(
                Self::ENV_REDELIVERY_INTERVAL_SECS,
                defaults.redelivery_interval,
            )?,
            stale_after: secs_or(Self::ENV_STALE_AFTER_SECS, defaults.stale_after)?,
            redelivery_batch: parse_or(Self::ENV_REDELIVERY_BATCH, defaults.redelivery_batch)?,
            max_query_chars: parse_or(Self::ENV_MAX_QUERY_CHARS, defaults.max_query_chars)?,
            evidence_results: parse_or(Self::ENV_EVIDENCE_RESULTS, defaults.evidence_results)?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive(Self::ENV_JOB_TIMEOUT_MS, self.job_timeout)?;
        require_positive(Self::ENV_REDELIVERY_INTERVAL_SECS, self.redelivery_interval)?;

        for (name, value) in [
            (Self::ENV_WORKER_CONCURRENCY, self.worker_concurrency),
            (Self::ENV_QUEUE_CAPACITY, self.queue_capacity),
            (Self::ENV_REDELIVERY_BATCH, self.redelivery_batch),
            (Self::ENV_MAX_QUERY_CHARS, self.max_query_chars),
            (Self::ENV_EVIDENCE_RESULTS, self.evidence_results),
        ] {
            if value == 0 {
                return Err(ConfigError::Constraint {
                    name,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }

    /// The job timeout must leave room for the slowest collaborator call.
    pub fn validate_against(&self, slowest_call: Option<Duration>) -> Result<(), ConfigError> {
        match slowest_call {
            Some(bound) if self.job_timeout <= bound => Err(ConfigError::Constraint {
                name: Self::ENV_JOB_TIMEOUT_MS,
                reason: format!(
                    "job timeout {}ms must exceed the slowest call timeout {}ms",
                    self.job_timeout.as_millis(),
                    bound.as_millis()
                ),
            }),
            _ => Ok(()),
        }
    }
}
