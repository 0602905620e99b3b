use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::store::DangerLevel;

/// Rating assigned to a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictLabel {
    True,
    MostlyTrue,
    Mixed,
    MostlyFalse,
    False,
    Unverifiable,
}

impl VerdictLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::MostlyTrue => "mostly_true",
            Self::Mixed => "mixed",
            Self::MostlyFalse => "mostly_false",
            Self::False => "false",
            Self::Unverifiable => "unverifiable",
        }
    }

    /// Verdicts that feed the misinformation counters.
    pub fn is_misinformation(&self) -> bool {
        matches!(self, Self::MostlyFalse | Self::False)
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerdictLabel {
    type Err = String;

    /// Lenient: `Mostly False`, `mostly-false` and `MOSTLY_FALSE` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "true" => Ok(Self::True),
            "mostly_true" => Ok(Self::MostlyTrue),
            "mixed" | "half_true" => Ok(Self::Mixed),
            "mostly_false" => Ok(Self::MostlyFalse),
            "false" => Ok(Self::False),
            "unverifiable" | "unverified" | "unknown" => Ok(Self::Unverifiable),
            _ => Err(format!("unknown verdict '{}'", s.trim())),
        }
    }
}

/// Output of a verdict generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub verdict: VerdictLabel,
    pub explanation: String,
    /// In `[0, 1]`.
    pub confidence: f32,
    pub danger_level: Option<DangerLevel>,
}

impl Verdict {
    pub fn new(verdict: VerdictLabel, explanation: impl Into<String>, confidence: f32) -> Self {
        Self {
            verdict,
            explanation: explanation.into(),
            confidence: confidence.clamp(0.0, 1.0),
            danger_level: None,
        }
    }

    pub fn with_danger_level(mut self, level: DangerLevel) -> Self {
        self.danger_level = Some(level);
        self
    }
}
