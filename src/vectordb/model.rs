use std::cmp::Ordering;

use qdrant_client::qdrant::ScoredPoint;
use serde::{Deserialize, Serialize};

use super::{ClaimIndexError, QUERY_PAYLOAD_KEY};

/// A similarity lookup request.
#[derive(Debug, Clone)]
pub struct SimilarityQuery {
    pub query_text: String,
    pub query_vector: Vec<f32>,
    pub similarity_threshold: f32,
    pub max_results: usize,
}

impl SimilarityQuery {
    pub fn new(
        query_text: impl Into<String>,
        query_vector: Vec<f32>,
        similarity_threshold: f32,
        max_results: usize,
    ) -> Self {
        Self {
            query_text: query_text.into(),
            query_vector,
            similarity_threshold,
            max_results,
        }
    }

    pub fn validate(&self) -> Result<(), ClaimIndexError> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(ClaimIndexError::InvalidThreshold {
                threshold: self.similarity_threshold,
            });
        }
        Ok(())
    }
}

/// A stored claim near the query vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarClaim {
    pub query: String,
    pub similarity: f32,
}

impl SimilarClaim {
    pub fn new(query: impl Into<String>, similarity: f32) -> Self {
        Self {
            query: query.into(),
            similarity,
        }
    }

    pub fn from_scored_point(point: ScoredPoint) -> Option<Self> {
        let query = point
            .payload
            .get(QUERY_PAYLOAD_KEY)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())?;

        Some(Self {
            query,
            similarity: point.score,
        })
    }
}

/// Orders by similarity descending, then text ascending so equal scores are stable.
pub fn sort_by_similarity(claims: &mut [SimilarClaim]) {
    claims.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.query.cmp(&b.query))
    });
}
