use std::time::Duration;

use crate::config::{ConfigError, bool_or, millis_or, require_positive, string_or};

pub const DEFAULT_VERDICT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct VerdictConfig {
    /// Model name handed to the `genai` client. Default: `gpt-4o-mini`.
    pub model: String,

    /// Bound on one generation call. Default: 60s.
    pub timeout: Duration,

    /// Answer with canned verdicts instead of calling a model.
    pub mock: bool,
}

impl Default for VerdictConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_VERDICT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
            mock: false,
        }
    }
}

impl VerdictConfig {
    const ENV_MODEL: &'static str = "VERITY_VERDICT_MODEL";
    const ENV_TIMEOUT_MS: &'static str = "VERITY_VERDICT_TIMEOUT_MS";
    const ENV_MOCK: &'static str = "VERITY_MOCK_VERDICTS";

    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            model: string_or(Self::ENV_MODEL, defaults.model),
            timeout: millis_or(Self::ENV_TIMEOUT_MS, defaults.timeout)?,
            mock: bool_or(Self::ENV_MOCK, defaults.mock)?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Constraint {
                name: Self::ENV_MODEL,
                reason: "model name cannot be empty".to_string(),
            });
        }
        require_positive(Self::ENV_TIMEOUT_MS, self.timeout)
    }
}
