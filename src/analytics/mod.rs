//! Ranked analytics lists built from the claim counters.

mod cluster;
mod config;
mod service;

#[cfg(test)]
mod tests;

pub use cluster::{
    ClaimCluster, ClaimMetadata, ClusterCandidate, ClusterThresholds, ThresholdError,
    build_top_list,
};
pub use config::AnalyticsConfig;
pub use service::{AnalyticsService, TopItem, TopListKind};
