use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time;
use tracing::{debug, info, warn};

use super::{JobOrchestrator, JobReceiver};

/// Drains the job queue, processing up to `concurrency` jobs at once.
pub struct JobWorker {
    orchestrator: Arc<JobOrchestrator>,
    concurrency: usize,
}

impl JobWorker {
    pub fn new(orchestrator: Arc<JobOrchestrator>, concurrency: usize) -> Self {
        Self {
            orchestrator,
            concurrency: concurrency.max(1),
        }
    }

    /// Runs until the queue closes or `shutdown` flips to `true`.
    ///
    /// The returned handle resolves only after every job already started has
    /// reached a terminal state.
    pub fn spawn(self, mut receiver: JobReceiver, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let permits = Arc::new(Semaphore::new(self.concurrency));
            let mut in_flight = JoinSet::new();
            info!(concurrency = self.concurrency, "job worker started");

            loop {
                let job_id = tokio::select! {
                    next = receiver.recv() => match next {
                        Some(id) => id,
                        None => break,
                    },
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                        continue;
                    }
                };

                let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                    break;
                };
                while in_flight.try_join_next().is_some() {}

                let orchestrator = Arc::clone(&self.orchestrator);
                in_flight.spawn(async move {
                    let _permit = permit;
                    match orchestrator.process(job_id).await {
                        Ok(outcome) => debug!(%job_id, ?outcome, "job processed"),
                        Err(e) => warn!(%job_id, error = %e, "job could not be processed"),
                    }
                });
            }

            if !in_flight.is_empty() {
                info!(in_flight = in_flight.len(), "draining in-flight jobs");
            }
            while let Some(joined) = in_flight.join_next().await {
                if let Err(e) = joined {
                    warn!(error = %e, "job task aborted");
                }
            }

            info!("job worker stopped");
        })
    }
}

/// Periodically re-triggers jobs that stayed `pending` too long.
pub struct RedeliverySweeper {
    orchestrator: Arc<JobOrchestrator>,
    interval: Duration,
    shutdown_initiated: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

impl RedeliverySweeper {
    pub fn new(orchestrator: Arc<JobOrchestrator>, interval: Duration) -> Self {
        Self {
            orchestrator,
            interval,
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts the sweep task (no-op if already running).
    pub fn start(&self) -> JoinHandle<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return tokio::spawn(async {});
        }

        let orchestrator = Arc::clone(&self.orchestrator);
        let shutdown_initiated = Arc::clone(&self.shutdown_initiated);
        let running = Arc::clone(&self.running);
        let period = self.interval;

        tokio::spawn(async move {
            let mut interval = time::interval(period);
            // The first tick completes immediately; skip it so a fresh start does not sweep
            // jobs that were just submitted.
            interval.tick().await;
            loop {
                interval.tick().await;
                if shutdown_initiated.load(Ordering::Acquire) {
                    break;
                }
                if let Err(e) = orchestrator.redeliver_stale().await {
                    warn!(error = %e, "redelivery sweep failed");
                }
            }
            running.store(false, Ordering::Release);
        })
    }

    /// Stops the task at its next tick.
    pub fn shutdown(&self) {
        self.shutdown_initiated.store(true, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}
