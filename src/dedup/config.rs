use std::time::Duration;

use crate::config::{ConfigError, millis_or, parse_or, require_positive, require_unit_interval};
use crate::constants::{DEFAULT_REPRESENTATIVE_THRESHOLD, DEFAULT_SIMILAR_MAX_RESULTS};

#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// Minimum similarity for two claims to share a canonical form. Default: `0.80`.
    pub representative_threshold: f32,

    /// Neighbours fetched per similarity lookup. Default: `10`.
    pub similar_max_results: usize,

    /// Bound on each embedding and index call. Default: 10s.
    pub lookup_timeout: Duration,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            representative_threshold: DEFAULT_REPRESENTATIVE_THRESHOLD,
            similar_max_results: DEFAULT_SIMILAR_MAX_RESULTS,
            lookup_timeout: Duration::from_secs(10),
        }
    }
}

impl DedupConfig {
    const ENV_THRESHOLD: &'static str = "VERITY_DEDUP_THRESHOLD";
    const ENV_MAX_RESULTS: &'static str = "VERITY_DEDUP_MAX_RESULTS";
    const ENV_TIMEOUT_MS: &'static str = "VERITY_DEDUP_TIMEOUT_MS";

    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            representative_threshold: parse_or(
                Self::ENV_THRESHOLD,
                defaults.representative_threshold,
            )?,
            similar_max_results: parse_or(Self::ENV_MAX_RESULTS, defaults.similar_max_results)?,
            lookup_timeout: millis_or(Self::ENV_TIMEOUT_MS, defaults.lookup_timeout)?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_unit_interval(Self::ENV_THRESHOLD, self.representative_threshold)?;
        if self.similar_max_results == 0 {
            return Err(ConfigError::Constraint {
                name: Self::ENV_MAX_RESULTS,
                reason: "must be at least 1".to_string(),
            });
        }
        require_positive(Self::ENV_TIMEOUT_MS, self.lookup_timeout)
    }
}
