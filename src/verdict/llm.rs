//! Verdicts from a chat model through the `genai` client.
//!
//! The model is asked for a single JSON object:
//! `{"verdict", "explanation", "confidence", "danger_level"}`. Answers wrapped in prose or
//! markdown fences are tolerated.

use std::time::Duration;

use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatRequest};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{Verdict, VerdictConfig, VerdictError, VerdictGenerator, VerdictLabel};
use crate::store::DangerLevel;

const SYSTEM_PROMPT: &str = "You are a fact-checking assistant. Judge the claim using only \
the numbered evidence provided. Reply with one JSON object and nothing else, with keys: \
\"verdict\" (one of true, mostly_true, mixed, mostly_false, false, unverifiable), \
\"explanation\" (two to four sentences citing evidence numbers), \
\"confidence\" (number between 0 and 1), \
\"danger_level\" (one of low, medium, high, critical; how harmful the claim is if believed).";

#[derive(Debug, Deserialize)]
struct RawVerdict {
    verdict: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    danger_level: Option<String>,
}

pub struct GenaiVerdictGenerator {
    client: Client,
    model: String,
    timeout: Duration,
}

impl GenaiVerdictGenerator {
    pub fn new(config: &VerdictConfig) -> Self {
        Self {
            client: Client::default(),
            model: config.model.clone(),
            timeout: config.timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl VerdictGenerator for GenaiVerdictGenerator {
    #[instrument(skip(self, claim, evidence), fields(model = %self.model, evidence_len = evidence.len()))]
    async fn generate(&self, claim: &str, evidence: &str) -> Result<Verdict, VerdictError> {
        if claim.trim().is_empty() {
            return Err(VerdictError::InvalidInput {
                reason: "claim is empty".to_string(),
            });
        }

        let request = ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_prompt(claim, evidence)),
        ]);

        let response =
            match tokio::time::timeout(self.timeout, self.client.exec_chat(&self.model, request, None))
                .await
            {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    warn!(error = %e, "verdict model request failed");
                    return Err(VerdictError::Unavailable {
                        reason: e.to_string(),
                    });
                }
                Err(_) => {
                    return Err(VerdictError::Timeout {
                        timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    });
                }
            };

        let text = response.first_text().unwrap_or_default();
        debug!(response_len = text.len(), "verdict model answered");
        parse_verdict(text)
    }
}

fn build_prompt(claim: &str, evidence: &str) -> String {
    let evidence = if evidence.trim().is_empty() {
        "(no evidence available)"
    } else {
        evidence
    };
    format!("Claim:\n{}\n\nEvidence:\n{}", claim.trim(), evidence)
}

/// Reads the first JSON object in `text`.
pub(crate) fn parse_verdict(text: &str) -> Result<Verdict, VerdictError> {
    let json = extract_json_object(text).ok_or_else(|| VerdictError::MalformedResponse {
        reason: "no JSON object in response".to_string(),
    })?;

    let raw: RawVerdict =
        serde_json::from_str(json).map_err(|e| VerdictError::MalformedResponse {
            reason: e.to_string(),
        })?;

    let label: VerdictLabel = raw
        .verdict
        .parse()
        .map_err(|reason| VerdictError::MalformedResponse { reason })?;

    let danger_level = raw
        .danger_level
        .as_deref()
        .and_then(|level| match level.parse::<DangerLevel>() {
            Ok(level) => Some(level),
            Err(reason) => {
                debug!(%reason, "ignoring unreadable danger level");
                None
            }
        });

    #[allow(clippy::cast_possible_truncation)]
    let confidence = raw.confidence.unwrap_or(0.5).clamp(0.0, 1.0) as f32;

    Ok(Verdict {
        verdict: label,
        explanation: raw.explanation.trim().to_string(),
        confidence,
        danger_level,
    })
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
