//! Work queue between submission and processing.
//!
//! Triggering is fire-and-forget: a failed trigger leaves the job `pending`, where the
//! redelivery sweep or a manual `process` call picks it up later.

use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TriggerError {
    #[error("job queue is full")]
    QueueFull,

    #[error("job queue is closed")]
    Closed,
}

/// Requests asynchronous processing of a job. Must not block.
pub trait JobTrigger: Send + Sync {
    fn trigger(&self, job_id: Uuid) -> Result<(), TriggerError>;
}

/// Sending half of the bounded job queue.
#[derive(Debug, Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<Uuid>,
}

/// Receiving half, owned by the worker pool.
#[derive(Debug)]
pub struct JobReceiver {
    rx: mpsc::Receiver<Uuid>,
}

impl JobQueue {
    pub fn channel(capacity: usize) -> (JobQueue, JobReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (JobQueue { tx }, JobReceiver { rx })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl JobTrigger for JobQueue {
    fn trigger(&self, job_id: Uuid) -> Result<(), TriggerError> {
        self.tx.try_send(job_id).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TriggerError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => TriggerError::Closed,
        })
    }
}

impl JobReceiver {
    /// Next job id, or `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Uuid> {
        self.rx.recv().await
    }
}
