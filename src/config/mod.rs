//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `VERITY_*` environment variables.
//! Component configs ([`SearchConfig`](crate::search::SearchConfig),
//! [`JobConfig`](crate::jobs::JobConfig) and friends) read their own variables through the
//! helpers in this module so parsing rules stay uniform.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{DEFAULT_EMBEDDING_DIM, DimConfig};
use crate::vectordb::DEFAULT_COLLECTION_NAME;

/// Process-level configuration: bind address and which backing services to use.
///
/// Optional URLs select the production backend when present and the in-process fallback
/// when absent (memory store, in-memory claim index, stub embedder).
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Postgres connection string for jobs, cached results and counters.
    pub database_url: Option<String>,

    /// Connection pool ceiling for Postgres. Default: `10`.
    pub database_max_connections: u32,

    /// Qdrant endpoint URL for the claim embedding index.
    pub qdrant_url: Option<String>,

    /// Qdrant collection holding claim embeddings. Default: `claim_embeddings`.
    pub qdrant_collection: String,

    /// External embedding service endpoint. When unset the stub embedder is used.
    pub embedding_url: Option<String>,

    /// Bearer token sent to the embedding service.
    pub embedding_api_key: Option<String>,

    /// Expected embedding dimension. Default: `1536`.
    pub embedding_dim: usize,

    /// Request timeout for the embedding service. Default: 10s.
    pub embedding_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            database_url: None,
            database_max_connections: 10,
            qdrant_url: None,
            qdrant_collection: DEFAULT_COLLECTION_NAME.to_string(),
            embedding_url: None,
            embedding_api_key: None,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            embedding_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "VERITY_PORT";
    const ENV_BIND_ADDR: &'static str = "VERITY_BIND_ADDR";
    const ENV_DATABASE_URL: &'static str = "VERITY_DATABASE_URL";
    const ENV_DATABASE_MAX_CONNECTIONS: &'static str = "VERITY_DATABASE_MAX_CONNECTIONS";
    const ENV_QDRANT_URL: &'static str = "VERITY_QDRANT_URL";
    const ENV_QDRANT_COLLECTION: &'static str = "VERITY_QDRANT_COLLECTION";
    const ENV_EMBEDDING_URL: &'static str = "VERITY_EMBEDDING_URL";
    const ENV_EMBEDDING_API_KEY: &'static str = "VERITY_EMBEDDING_API_KEY";
    const ENV_EMBEDDING_DIM: &'static str = "VERITY_EMBEDDING_DIM";
    const ENV_EMBEDDING_TIMEOUT_MS: &'static str = "VERITY_EMBEDDING_TIMEOUT_MS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            port: Self::parse_port_from_env(defaults.port)?,
            bind_addr: Self::parse_bind_addr_from_env(defaults.bind_addr)?,
            database_url: optional_string(Self::ENV_DATABASE_URL),
            database_max_connections: parse_or(
                Self::ENV_DATABASE_MAX_CONNECTIONS,
                defaults.database_max_connections,
            )?,
            qdrant_url: optional_string(Self::ENV_QDRANT_URL),
            qdrant_collection: string_or(Self::ENV_QDRANT_COLLECTION, defaults.qdrant_collection),
            embedding_url: optional_string(Self::ENV_EMBEDDING_URL),
            embedding_api_key: optional_string(Self::ENV_EMBEDDING_API_KEY),
            embedding_dim: parse_or(Self::ENV_EMBEDDING_DIM, defaults.embedding_dim)?,
            embedding_timeout: millis_or(
                Self::ENV_EMBEDDING_TIMEOUT_MS,
                defaults.embedding_timeout,
            )?,
        })
    }

    /// Checks basic invariants that parsing alone cannot catch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_max_connections == 0 {
            return Err(ConfigError::Constraint {
                name: Self::ENV_DATABASE_MAX_CONNECTIONS,
                reason: "must be at least 1".to_string(),
            });
        }

        DimConfig::new(self.embedding_dim).validate().map_err(|e| {
            ConfigError::Constraint {
                name: Self::ENV_EMBEDDING_DIM,
                reason: e.to_string(),
            }
        })?;

        if self.qdrant_collection.trim().is_empty() {
            return Err(ConfigError::Constraint {
                name: Self::ENV_QDRANT_COLLECTION,
                reason: "collection name cannot be empty".to_string(),
            });
        }

        require_positive(Self::ENV_EMBEDDING_TIMEOUT_MS, self.embedding_timeout)
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }
}

/// Reads a trimmed, non-empty variable.
pub(crate) fn optional_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn string_or(name: &str, default: String) -> String {
    optional_string(name).unwrap_or(default)
}

/// Parses a variable with [`FromStr`], failing loudly on garbage instead of silently
/// falling back.
pub(crate) fn parse_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_string(name) {
        Some(value) => value
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                name,
                value,
                reason: e.to_string(),
            }),
        None => Ok(default),
    }
}

pub(crate) fn millis_or(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    let fallback = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    parse_or(name, fallback).map(Duration::from_millis)
}

pub(crate) fn secs_or(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    parse_or(name, default.as_secs()).map(Duration::from_secs)
}

/// Accepts `1/0`, `true/false`, `yes/no` and `on/off` (case-insensitive).
pub(crate) fn bool_or(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match optional_string(name) {
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                name,
                value,
                reason: "expected a boolean".to_string(),
            }),
        },
        None => Ok(default),
    }
}

pub(crate) fn require_positive(name: &'static str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::Constraint {
            name,
            reason: "duration must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// Similarity thresholds live in `(0, 1]`.
pub(crate) fn require_unit_interval(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(ConfigError::Constraint {
            name,
            reason: format!("threshold {value} must be in (0, 1]"),
        });
    }
    Ok(())
}
