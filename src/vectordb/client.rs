use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, GetPointsBuilder, PointId, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use tracing::{debug, info};

use super::error::ClaimIndexError;
use super::model::{SimilarClaim, SimilarityQuery, sort_by_similarity};
use super::{ClaimIndex, QUERY_PAYLOAD_KEY, WriteConsistency};
use crate::hashing::claim_point_id;

#[derive(Clone)]
/// Claim index stored in a Qdrant collection.
///
/// Point ids are BLAKE3-derived from the exact claim text and the text itself is kept in the
/// `query` payload field.
pub struct QdrantClaimIndex {
    client: Qdrant,
    url: String,
    collection: String,
    vector_size: u64,
    consistency: WriteConsistency,
}

impl QdrantClaimIndex {
    /// Creates a client for `url`. Does not touch the network.
    pub fn new(url: &str, collection: &str, vector_size: u64) -> Result<Self, ClaimIndexError> {
        let client =
            Qdrant::from_url(url)
                .build()
                .map_err(|e| ClaimIndexError::ConnectionFailed {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

        Ok(Self {
            client,
            url: url.to_string(),
            collection: collection.to_string(),
            vector_size,
            consistency: WriteConsistency::Strong,
        })
    }

    pub fn with_consistency(mut self, consistency: WriteConsistency) -> Self {
        self.consistency = consistency;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Ensures the collection exists (creates it with cosine distance if missing).
    pub async fn ensure_collection(&self) -> Result<(), ClaimIndexError> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| self.create_error(e))?;

        if !exists {
            let vectors_config = VectorParamsBuilder::new(self.vector_size, Distance::Cosine);
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection)
                        .vectors_config(vectors_config)
                        .on_disk_payload(true),
                )
                .await
                .map_err(|e| self.create_error(e))?;

            info!(
                collection = %self.collection,
                vector_size = self.vector_size,
                "Created claim embedding collection"
            );
        }

        Ok(())
    }

    fn create_error(&self, e: impl std::fmt::Display) -> ClaimIndexError {
        ClaimIndexError::CreateCollectionFailed {
            collection: self.collection.clone(),
            message: e.to_string(),
        }
    }

    fn check_dimension(&self, actual: usize) -> Result<(), ClaimIndexError> {
        if actual as u64 != self.vector_size {
            return Err(ClaimIndexError::InvalidDimension {
                expected: self.vector_size as usize,
                actual,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ClaimIndex for QdrantClaimIndex {
    async fn contains(&self, query: &str) -> Result<bool, ClaimIndexError> {
        let id = PointId::from(claim_point_id(query));

        let response = self
            .client
            .get_points(GetPointsBuilder::new(&self.collection, vec![id]).with_payload(true))
            .await
            .map_err(|e| ClaimIndexError::ReadFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        // A truncated-hash collision shows up as a point holding different text.
        Ok(response.result.iter().any(|point| {
            point
                .payload
                .get(QUERY_PAYLOAD_KEY)
                .and_then(|v| v.as_str())
                .is_some_and(|stored| stored == query)
        }))
    }

    async fn insert_if_absent(
        &self,
        query: &str,
        vector: Vec<f32>,
    ) -> Result<bool, ClaimIndexError> {
        self.check_dimension(vector.len())?;

        if self.contains(query).await? {
            return Ok(false);
        }

        let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
        payload.insert(QUERY_PAYLOAD_KEY.to_string(), query.to_string().into());
        let point = PointStruct::new(claim_point_id(query), vector, payload);

        self.client
            .upsert_points(
                UpsertPointsBuilder::new(&self.collection, vec![point])
                    .wait(self.consistency.into()),
            )
            .await
            .map_err(|e| ClaimIndexError::UpsertFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        debug!(collection = %self.collection, "Stored claim embedding");
        Ok(true)
    }

    async fn search(
        &self,
        request: SimilarityQuery,
    ) -> Result<Vec<SimilarClaim>, ClaimIndexError> {
        request.validate()?;
        self.check_dimension(request.query_vector.len())?;

        let builder = SearchPointsBuilder::new(
            &self.collection,
            request.query_vector,
            request.max_results as u64,
        )
        .with_payload(true)
        .score_threshold(request.similarity_threshold);

        let response = self.client.search_points(builder).await.map_err(|e| {
            ClaimIndexError::SearchFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            }
        })?;

        let mut results: Vec<SimilarClaim> = response
            .result
            .into_iter()
            .filter_map(SimilarClaim::from_scored_point)
            .filter(|claim| claim.similarity >= request.similarity_threshold)
            .collect();
        sort_by_similarity(&mut results);

        Ok(results)
    }

    async fn health_check(&self) -> Result<(), ClaimIndexError> {
        self.client
            .health_check()
            .await
            .map_err(|e| ClaimIndexError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}
