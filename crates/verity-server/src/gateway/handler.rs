use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::gateway::error::GatewayError;
use crate::gateway::payload::{
    CachedResponse, ClaimRequest, QueuedResponse, SearchRequest, SearchResponse, TopListParams,
    TopListResponse,
};
use crate::gateway::state::HandlerState;
use verity::VERITY_STATUS_HEADER;
use verity::jobs::SubmitOutcome;
use verity::search::ProviderHint;

const STATUS_CACHED: &str = "cached";
const STATUS_QUEUED: &str = "queued";

/// Parses a JSON body into `T`, reporting schema mismatches as `400`.
pub(crate) fn parse_body<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, GatewayError> {
    serde_json::from_value(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid request schema: {}", e)))
}

fn parse_job_id(raw: &str) -> Result<Uuid, GatewayError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| GatewayError::InvalidRequest(format!("malformed job id '{}'", raw)))
}

fn status_headers(value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(VERITY_STATUS_HEADER, HeaderValue::from_static(value));
    headers
}

#[instrument(skip(state, body))]
pub async fn submit_claim_handler(
    State(state): State<HandlerState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, GatewayError> {
    let request: ClaimRequest = parse_body(body)?;

    match state.orchestrator.submit(&request.query).await? {
        SubmitOutcome::Cache { query, result } => {
            debug!(canonical = %query, "claim answered from cache");
            let body = CachedResponse {
                query,
                result,
                source: "cache",
            };
            Ok((StatusCode::OK, status_headers(STATUS_CACHED), Json(body)).into_response())
        }
        SubmitOutcome::Queued { job_id } => {
            info!(%job_id, "claim queued for verification");
            Ok((
                StatusCode::ACCEPTED,
                status_headers(STATUS_QUEUED),
                Json(QueuedResponse { job_id }),
            )
                .into_response())
        }
    }
}

#[instrument(skip(state))]
pub async fn job_status_handler(
    State(state): State<HandlerState>,
    Path(job_id): Path<String>,
) -> Result<Response, GatewayError> {
    let job_id = parse_job_id(&job_id)?;
    let view = state.orchestrator.get_status(job_id).await?;
    Ok(Json(view).into_response())
}

/// Runs a job in the request task. Safe to repeat: only one caller claims a pending job.
#[instrument(skip(state))]
pub async fn process_job_handler(
    State(state): State<HandlerState>,
    Path(job_id): Path<String>,
) -> Result<Response, GatewayError> {
    let job_id = parse_job_id(&job_id)?;
    let outcome = state.orchestrator.process(job_id).await?;
    Ok(Json(outcome).into_response())
}

#[instrument(skip(state, body))]
pub async fn search_handler(
    State(state): State<HandlerState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, GatewayError> {
    let request: SearchRequest = parse_body(body)?;
    let hint = match request.provider.as_deref() {
        Some(raw) => raw
            .parse::<ProviderHint>()
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?,
        None => ProviderHint::Auto,
    };

    let outcome = state
        .search
        .search(&request.query, request.max_results, &hint)
        .await
        .map_err(verity::error::PipelineError::from)?;

    debug!(
        results = outcome.results.len(),
        engine = %outcome.provider_label,
        synthetic = outcome.is_synthetic,
        "search served"
    );
    Ok(Json(SearchResponse::from(outcome)).into_response())
}

#[instrument(skip(state))]
pub async fn top_searched_handler(
    State(state): State<HandlerState>,
    Query(params): Query<TopListParams>,
) -> Result<Response, GatewayError> {
    let items = state.analytics.top_searched(params.limit).await?;
    Ok(Json(TopListResponse { items }).into_response())
}

#[instrument(skip(state))]
pub async fn top_misinformation_handler(
    State(state): State<HandlerState>,
    Query(params): Query<TopListParams>,
) -> Result<Response, GatewayError> {
    let items = state.analytics.top_misinformation(params.limit).await?;
    Ok(Json(TopListResponse { items }).into_response())
}
