use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{ClaimIndex, ClaimIndexError, SimilarClaim, SimilarityQuery, sort_by_similarity};

/// Brute-force cosine index held in process memory.
#[derive(Debug, Default)]
pub struct MemoryClaimIndex {
    points: RwLock<HashMap<String, Vec<f32>>>,
    vector_size: Option<usize>,
}

impl MemoryClaimIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects vectors whose length differs from `vector_size`.
    pub fn with_vector_size(vector_size: usize) -> Self {
        Self {
            points: RwLock::new(HashMap::new()),
            vector_size: Some(vector_size),
        }
    }

    pub fn len(&self) -> usize {
        self.points.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.read().is_empty()
    }

    fn check_dimension(&self, actual: usize) -> Result<(), ClaimIndexError> {
        match self.vector_size {
            Some(expected) if expected != actual => {
                Err(ClaimIndexError::InvalidDimension { expected, actual })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ClaimIndex for MemoryClaimIndex {
    async fn contains(&self, query: &str) -> Result<bool, ClaimIndexError> {
        Ok(self.points.read().contains_key(query))
    }

    async fn insert_if_absent(
        &self,
        query: &str,
        vector: Vec<f32>,
    ) -> Result<bool, ClaimIndexError> {
        self.check_dimension(vector.len())?;

        let mut points = self.points.write();
        if points.contains_key(query) {
            return Ok(false);
        }
        points.insert(query.to_string(), vector);
        Ok(true)
    }

    async fn search(
        &self,
        request: SimilarityQuery,
    ) -> Result<Vec<SimilarClaim>, ClaimIndexError> {
        request.validate()?;
        self.check_dimension(request.query_vector.len())?;

        let mut results: Vec<SimilarClaim> = self
            .points
            .read()
            .iter()
            .map(|(text, vector)| {
                SimilarClaim::new(text.clone(), cosine_similarity(&request.query_vector, vector))
            })
            .filter(|claim| claim.similarity >= request.similarity_threshold)
            .collect();

        sort_by_similarity(&mut results);
        results.truncate(request.max_results);

        Ok(results)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let norm_a = norm_a.sqrt();
    let norm_b = norm_b.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
