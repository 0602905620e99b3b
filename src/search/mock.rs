use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{QueryLimits, SearchError, SearchProvider, SearchResult};

/// One scripted provider response.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Results(Vec<SearchResult>),
    /// Fail with this HTTP status.
    Fail(u16),
    /// Never answer (until the aggregator's timeout fires).
    Hang,
}

/// Provider that replays a script of responses and records every query it receives.
pub struct ScriptedProvider {
    id: String,
    label: String,
    limits: QueryLimits,
    timeout: Duration,
    script: Mutex<VecDeque<ScriptStep>>,
    fallback: ScriptStep,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    /// Answers with no results once the script runs out.
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            limits: QueryLimits::unlimited(),
            timeout: Duration::from_secs(1),
            script: Mutex::new(VecDeque::new()),
            fallback: ScriptStep::Results(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always returns `results`.
    pub fn returning(id: &str, label: &str, results: Vec<SearchResult>) -> Self {
        Self::new(id, label).otherwise(ScriptStep::Results(results))
    }

    /// Always fails with `status`.
    pub fn failing(id: &str, label: &str, status: u16) -> Self {
        Self::new(id, label).otherwise(ScriptStep::Fail(status))
    }

    pub fn with_limits(mut self, limits: QueryLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Queues one response.
    pub fn then(self, step: ScriptStep) -> Self {
        self.script.lock().push_back(step);
        self
    }

    /// Response used after the queue is drained.
    pub fn otherwise(mut self, step: ScriptStep) -> Self {
        self.fallback = step;
        self
    }

    /// Queries received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl SearchProvider for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn limits(&self) -> QueryLimits {
        self.limits
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        self.calls.lock().push(query.to_string());
        let step = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match step {
            ScriptStep::Results(mut results) => {
                results.truncate(max_results);
                Ok(results)
            }
            ScriptStep::Fail(status) => Err(SearchError::HttpStatus {
                provider: self.id.clone(),
                status,
            }),
            ScriptStep::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
        }
    }
}

/// `n` distinct results whose URLs live under `https://{site}/`.
pub fn sample_results(site: &str, n: usize) -> Vec<SearchResult> {
    (1..=n)
        .map(|i| {
            SearchResult::new(
                format!("{site} article {i}"),
                format!("https://{site}/article-{i}"),
                format!("Snippet {i} from {site}"),
            )
        })
        .collect()
}
