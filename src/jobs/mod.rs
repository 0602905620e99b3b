//! Asynchronous verification jobs.
//!
//! [`JobOrchestrator::submit`] answers from the result cache or creates a `pending` job and
//! triggers it through the [`JobQueue`]. A [`JobWorker`] pool drains the queue and calls
//! [`JobOrchestrator::process`]. Delivery is at-least-once: the [`RedeliverySweeper`]
//! re-triggers jobs left `pending`, and the `pending → processing` claim in the store makes
//! duplicate deliveries harmless.

mod config;
mod orchestrator;
mod queue;
mod report;
mod worker;


pub use config::JobConfig;
pub use orchestrator::{JobOrchestrator, JobStatusView, ProcessOutcome, SubmitOutcome};
pub use queue::{JobQueue, JobReceiver, JobTrigger, TriggerError};
pub use report::{VerificationReport, render_evidence};
pub use worker::{JobWorker, RedeliverySweeper};
