use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{Verdict, VerdictError, VerdictGenerator, VerdictLabel};
use crate::store::DangerLevel;

/// Canned verdicts without a model call.
///
/// Backs `VERITY_MOCK_VERDICTS=1` deployments as well as tests.
pub struct MockVerdictGenerator {
    label: VerdictLabel,
    confidence: f32,
    danger_level: Option<DangerLevel>,
    delay: Duration,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl Default for MockVerdictGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVerdictGenerator {
    pub fn new() -> Self {
        Self {
            label: VerdictLabel::Unverifiable,
            confidence: 0.5,
            danger_level: None,
            delay: Duration::ZERO,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_verdict(mut self, label: VerdictLabel, danger_level: Option<DangerLevel>) -> Self {
        self.label = label;
        self.danger_level = danger_level;
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VerdictGenerator for MockVerdictGenerator {
    async fn generate(&self, claim: &str, evidence: &str) -> Result<Verdict, VerdictError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(VerdictError::Unavailable {
                reason: "mock verdict generator set to fail".to_string(),
            });
        }

        let sources = evidence.lines().filter(|l| l.starts_with('[')).count();
        Ok(Verdict {
            verdict: self.label,
            explanation: format!("Mock verdict for: {} ({sources} sources)", claim.trim()),
            confidence: self.confidence,
            danger_level: self.danger_level,
        })
    }

    fn is_mock(&self) -> bool {
        true
    }
}
