use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::search::{SearchOutcome, SearchResult};
use crate::store::DangerLevel;
use crate::verdict::{Verdict, VerdictLabel};

/// Stored verdict payload for a completed job.
///
/// Persisted as JSON in the job row and the result cache; readers treat it as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub verdict: VerdictLabel,
    pub explanation: String,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub danger_level: Option<DangerLevel>,
    pub sources: Vec<SearchResult>,
    pub search_engine: String,
    /// Evidence was a placeholder or the verdict was canned.
    pub is_mock: bool,
    pub used_simplified_query: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_query: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl VerificationReport {
    pub fn new(verdict: Verdict, evidence: &SearchOutcome, mock_verdict: bool) -> Self {
        Self {
            verdict: verdict.verdict,
            explanation: verdict.explanation,
            confidence: verdict.confidence,
            danger_level: verdict.danger_level,
            sources: evidence
                .results
                .iter()
                .filter(|r| !r.url.is_empty())
                .cloned()
                .collect(),
            search_engine: evidence.provider_label.clone(),
            is_mock: evidence.is_synthetic || mock_verdict,
            used_simplified_query: evidence.used_simplified_query,
            original_query: evidence.original_query.clone(),
            checked_at: Utc::now(),
        }
    }
}

/// Numbered evidence blocks handed to the verdict generator:
///
/// ```text
/// [1] title
/// url
/// snippet
/// ```
pub fn render_evidence(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let mut block = format!("[{}] {}", i + 1, r.title.trim());
            if !r.url.is_empty() {
                block.push('\n');
                block.push_str(&r.url);
            }
            if !r.snippet.trim().is_empty() {
                block.push('\n');
                block.push_str(r.snippet.trim());
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
