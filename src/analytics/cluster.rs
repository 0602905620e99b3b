//! Greedy similarity clustering of counted claims.
//!
//! Candidates are visited once, highest count first. Each visit asks the similarity lookup
//! for neighbours of the candidate, then either joins the best-matching open cluster (whose
//! representative is a close enough neighbour) or opens a new one. Neighbours closer than
//! the absorb threshold are folded into the same cluster and never visited on their own, so
//! every count lands in exactly one cluster.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::{
    DEFAULT_CLUSTER_ABSORB_THRESHOLD, DEFAULT_CLUSTER_JOIN_THRESHOLD, MAX_SIMILAR_MEMBERS,
};
use crate::dedup::SimilarityLookup;
use crate::store::DangerLevel;
use crate::vectordb::SimilarClaim;

/// Extra facts carried with a counted claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClaimMetadata {
    pub danger_level: Option<DangerLevel>,
}

impl ClaimMetadata {
    pub fn with_danger_level(danger_level: Option<DangerLevel>) -> Self {
        Self { danger_level }
    }

    /// Higher is more important; `0` when nothing is known.
    pub fn priority(&self) -> u8 {
        self.danger_level.map_or(0, |level| level.severity())
    }

    /// Keeps the more severe level.
    pub fn merge(&mut self, other: &ClaimMetadata) {
        self.danger_level = self.danger_level.max(other.danger_level);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterCandidate {
    pub query: String,
    pub count: i64,
    pub metadata: ClaimMetadata,
}

impl ClusterCandidate {
    pub fn new(query: impl Into<String>, count: i64) -> Self {
        Self {
            query: query.into(),
            count,
            metadata: ClaimMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: ClaimMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// One entry of a top list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimCluster {
    pub representative: String,
    pub total_count: i64,
    pub metadata: ClaimMetadata,
    /// Up to five other phrasings, members first.
    pub similar_members: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterThresholds {
    /// Minimum similarity to a cluster's representative to join it.
    pub join: f32,
    /// Minimum similarity for a neighbour to be folded in without its own visit.
    pub absorb: f32,
}

/// Rejected [`ClusterThresholds`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("{name} threshold {value} must be in (0, 1]")]
    OutOfRange { name: &'static str, value: f32 },

    #[error("absorb threshold {absorb} must not be below join threshold {join}")]
    AbsorbBelowJoin { absorb: f32, join: f32 },
}

impl Default for ClusterThresholds {
    fn default() -> Self {
        Self {
            join: DEFAULT_CLUSTER_JOIN_THRESHOLD,
            absorb: DEFAULT_CLUSTER_ABSORB_THRESHOLD,
        }
    }
}

impl ClusterThresholds {
    pub fn new(join: f32, absorb: f32) -> Result<Self, ThresholdError> {
        let thresholds = Self { join, absorb };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<(), ThresholdError> {
        for (name, value) in [("join", self.join), ("absorb", self.absorb)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ThresholdError::OutOfRange { name, value });
            }
        }
        if self.absorb < self.join {
            return Err(ThresholdError::AbsorbBelowJoin {
                absorb: self.absorb,
                join: self.join,
            });
        }
        Ok(())
    }

    /// Threshold used for the neighbour lookup.
    fn lookup(&self) -> f32 {
        self.join.min(self.absorb)
    }
}

#[derive(Debug)]
struct Member {
    query: String,
    count: i64,
    metadata: ClaimMetadata,
}

#[derive(Debug)]
struct OpenCluster {
    members: Vec<Member>,
    /// Index into `members`.
    representative: usize,
    metadata: ClaimMetadata,
    total: i64,
    related: Vec<SimilarClaim>,
}

impl OpenCluster {
    fn new(member: Member) -> Self {
        Self {
            total: member.count,
            metadata: member.metadata,
            members: vec![member],
            representative: 0,
            related: Vec::new(),
        }
    }

    fn representative(&self) -> &str {
        &self.members[self.representative].query
    }

    fn add(&mut self, member: Member) {
        self.total += member.count;
        self.metadata.merge(&member.metadata);
        self.members.push(member);

        let current = &self.members[self.representative];
        let newest = self.members.len() - 1;
        let candidate = &self.members[newest];
        if (candidate.metadata.priority(), candidate.count)
            > (current.metadata.priority(), current.count)
        {
            self.representative = newest;
        }
    }

    fn finish(self) -> ClaimCluster {
        let representative = self.members[self.representative].query.clone();
        let mut seen: HashSet<String> = HashSet::from([representative.to_lowercase()]);
        let mut similar_members = Vec::new();

        let mut related = self.related;
        related.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.query.cmp(&b.query))
        });

        let names = self
            .members
            .iter()
            .map(|m| m.query.as_str())
            .chain(related.iter().map(|r| r.query.as_str()));
        for name in names {
            if similar_members.len() == MAX_SIMILAR_MEMBERS {
                break;
            }
            if seen.insert(name.to_lowercase()) {
                similar_members.push(name.to_string());
            }
        }

        ClaimCluster {
            representative,
            total_count: self.total,
            metadata: self.metadata,
            similar_members,
        }
    }
}

/// Clusters `candidates` and returns the `limit` largest clusters.
///
/// `lookup_limit` caps the neighbours fetched per candidate. A failed lookup turns that
/// candidate into a singleton; the pass continues.
pub async fn build_top_list(
    lookup: &dyn SimilarityLookup,
    candidates: Vec<ClusterCandidate>,
    thresholds: ClusterThresholds,
    limit: usize,
    lookup_limit: usize,
) -> Vec<ClaimCluster> {
    let candidates = aggregate(candidates);
    let by_text: HashMap<&str, usize> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (c.query.as_str(), i))
        .collect();

    let mut processed: HashSet<String> = HashSet::new();
    let mut clusters: Vec<OpenCluster> = Vec::new();

    for candidate in &candidates {
        if processed.contains(&candidate.query) {
            continue;
        }

        let hits = match lookup
            .find_similar(&candidate.query, thresholds.lookup(), lookup_limit)
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                warn!(query = %candidate.query, error = %e, "similarity lookup failed, keeping claim alone");
                processed.insert(candidate.query.clone());
                clusters.push(OpenCluster::new(member(candidate)));
                continue;
            }
        };

        let target = best_cluster(&clusters, &hits, thresholds.join);
        let slot = match target {
            Some(slot) => {
                clusters[slot].add(member(candidate));
                slot
            }
            None => {
                clusters.push(OpenCluster::new(member(candidate)));
                clusters.len() - 1
            }
        };
        processed.insert(candidate.query.clone());

        for hit in &hits {
            if hit.query == candidate.query || hit.similarity < thresholds.absorb {
                continue;
            }
            if !processed.insert(hit.query.clone()) {
                continue;
            }
            if let Some(&index) = by_text.get(hit.query.as_str()) {
                debug!(absorbed = %hit.query, into = %clusters[slot].representative(), "absorbing near-duplicate");
                clusters[slot].add(member(&candidates[index]));
            }
        }

        clusters[slot].related.extend(
            hits.into_iter()
                .filter(|hit| hit.query != candidate.query),
        );
    }

    let mut finished: Vec<ClaimCluster> = clusters.into_iter().map(OpenCluster::finish).collect();
    finished.sort_by(|a, b| {
        b.total_count
            .cmp(&a.total_count)
            .then_with(|| b.metadata.priority().cmp(&a.metadata.priority()))
            .then_with(|| a.representative.cmp(&b.representative))
    });
    finished.truncate(limit);
    finished
}

/// Sums duplicate texts and orders by count descending, then text.
fn aggregate(candidates: Vec<ClusterCandidate>) -> Vec<ClusterCandidate> {
    let mut merged: HashMap<String, ClusterCandidate> = HashMap::new();
    for candidate in candidates {
        let query = candidate.query.trim().to_string();
        if query.is_empty() {
            continue;
        }
        merged
            .entry(query.clone())
            .and_modify(|existing| {
                existing.count += candidate.count;
                existing.metadata.merge(&candidate.metadata);
            })
            .or_insert(ClusterCandidate { query, ..candidate });
    }

    let mut out: Vec<ClusterCandidate> = merged.into_values().collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.query.cmp(&b.query)));
    out
}

/// Open cluster whose representative is the closest qualifying neighbour.
fn best_cluster(clusters: &[OpenCluster], hits: &[SimilarClaim], join: f32) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (slot, cluster) in clusters.iter().enumerate() {
        let representative = cluster.representative();
        let Some(hit) = hits
            .iter()
            .find(|hit| hit.query == representative && hit.similarity >= join)
        else {
            continue;
        };
        if best.is_none_or(|(_, similarity)| hit.similarity > similarity) {
            best = Some((slot, hit.similarity));
        }
    }
    best.map(|(slot, _)| slot)
}

fn member(candidate: &ClusterCandidate) -> Member {
    Member {
        query: candidate.query.clone(),
        count: candidate.count,
        metadata: candidate.metadata,
    }
}
