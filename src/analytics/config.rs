use std::time::Duration;

use super::ClusterThresholds;
use crate::config::{ConfigError, parse_or, require_positive, require_unit_interval, secs_or};
use crate::constants::{DEFAULT_CLUSTER_ABSORB_THRESHOLD, DEFAULT_CLUSTER_JOIN_THRESHOLD};

#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Default: `0.80`.
    pub join_threshold: f32,
    /// Must not be below `join_threshold`. Default: `0.85`.
    pub absorb_threshold: f32,
    /// Items returned when the caller gives no limit. Default: `10`.
    pub default_limit: usize,
    /// Largest accepted limit; lists are built at this size. Default: `50`.
    pub max_limit: usize,
    /// Counter rows read per list slot, so merged clusters still fill the list. Default: `5`.
    pub over_fetch_factor: usize,
    /// Neighbours fetched per candidate. Default: `20`.
    pub lookup_limit: usize,
    /// How long a built list is served before rebuilding. Default: 300s.
    pub cache_ttl: Duration,
    /// Background rebuild period; `None` disables the refresh task. Default: 600s.
    pub refresh_interval: Option<Duration>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            join_threshold: DEFAULT_CLUSTER_JOIN_THRESHOLD,
            absorb_threshold: DEFAULT_CLUSTER_ABSORB_THRESHOLD,
            default_limit: 10,
            max_limit: 50,
            over_fetch_factor: 5,
            lookup_limit: 20,
            cache_ttl: Duration::from_secs(300),
            refresh_interval: Some(Duration::from_secs(600)),
        }
    }
}

impl AnalyticsConfig {
    const ENV_JOIN_THRESHOLD: &'static str = "VERITY_CLUSTER_JOIN_THRESHOLD";
    const ENV_ABSORB_THRESHOLD: &'static str = "VERITY_CLUSTER_ABSORB_THRESHOLD";
    const ENV_DEFAULT_LIMIT: &'static str = "VERITY_ANALYTICS_DEFAULT_LIMIT";
    const ENV_MAX_LIMIT: &'static str = "VERITY_ANALYTICS_MAX_LIMIT";
    const ENV_OVER_FETCH: &'static str = "VERITY_ANALYTICS_OVER_FETCH";
    const ENV_LOOKUP_LIMIT: &'static str = "VERITY_ANALYTICS_LOOKUP_LIMIT";
    const ENV_CACHE_TTL_SECS: &'static str = "VERITY_ANALYTICS_CACHE_TTL_SECS";
    /// `0` disables the refresh task.
    const ENV_REFRESH_SECS: &'static str = "VERITY_ANALYTICS_REFRESH_SECS";

    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let refresh = secs_or(
            Self::ENV_REFRESH_SECS,
            defaults.refresh_interval.unwrap_or(Duration::ZERO),
        )?;

        Ok(Self {
            join_threshold: parse_or(Self::ENV_JOIN_THRESHOLD, defaults.join_threshold)?,
            absorb_threshold: parse_or(Self::ENV_ABSORB_THRESHOLD, defaults.absorb_threshold)?,
            default_limit: parse_or(Self::ENV_DEFAULT_LIMIT, defaults.default_limit)?,
            max_limit: parse_or(Self::ENV_MAX_LIMIT, defaults.max_limit)?,
            over_fetch_factor: parse_or(Self::ENV_OVER_FETCH, defaults.over_fetch_factor)?,
            lookup_limit: parse_or(Self::ENV_LOOKUP_LIMIT, defaults.lookup_limit)?,
            cache_ttl: secs_or(Self::ENV_CACHE_TTL_SECS, defaults.cache_ttl)?,
            refresh_interval: (!refresh.is_zero()).then_some(refresh),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_unit_interval(Self::ENV_JOIN_THRESHOLD, self.join_threshold)?;
        require_unit_interval(Self::ENV_ABSORB_THRESHOLD, self.absorb_threshold)?;
        self.thresholds()
            .validate()
            .map_err(|e| ConfigError::Constraint {
                name: Self::ENV_ABSORB_THRESHOLD,
                reason: e.to_string(),
            })?;

        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(ConfigError::Constraint {
                name: Self::ENV_DEFAULT_LIMIT,
                reason: format!("must be in 1..={}", self.max_limit),
            });
        }
        for (name, value) in [
            (Self::ENV_OVER_FETCH, self.over_fetch_factor),
            (Self::ENV_LOOKUP_LIMIT, self.lookup_limit),
        ] {
            if value == 0 {
                return Err(ConfigError::Constraint {
                    name,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        require_positive(Self::ENV_CACHE_TTL_SECS, self.cache_ttl)
    }

    pub fn thresholds(&self) -> ClusterThresholds {
        ClusterThresholds {
            join: self.join_threshold,
            absorb: self.absorb_threshold,
        }
    }

    /// Caller limit, defaulted and clamped into `1..=max_limit`.
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }
}
