//! Verdict generation.
//!
//! The pipeline treats the verdict generator as a black box: claim text and rendered
//! evidence in, [`Verdict`] out. [`GenaiVerdictGenerator`] asks a chat model through
//! `genai`; [`MockVerdictGenerator`] returns canned answers.

mod config;
mod error;
pub mod llm;
pub mod mock;
mod types;


use async_trait::async_trait;

pub use config::{DEFAULT_VERDICT_MODEL, VerdictConfig};
pub use error::VerdictError;
pub use llm::GenaiVerdictGenerator;
pub use mock::MockVerdictGenerator;
pub use types::{Verdict, VerdictLabel};

#[async_trait]
pub trait VerdictGenerator: Send + Sync {
    async fn generate(&self, claim: &str, evidence: &str) -> Result<Verdict, VerdictError>;

    /// Returns `true` when verdicts are canned rather than model output.
    fn is_mock(&self) -> bool {
        false
    }
}
