//! HTTP gateway (Axum) for claim submission, job polling, search and analytics.
//!
//! This module is primarily used by the `verity` server binary.

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;


use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use handler::{
    job_status_handler, process_job_handler, search_handler, submit_claim_handler,
    top_misinformation_handler, top_searched_handler,
};
pub use state::{Backends, HandlerState, PipelineSettings};

use verity::{
    VERITY_STATUS_ERROR, VERITY_STATUS_HEADER, VERITY_STATUS_HEALTHY, VERITY_STATUS_NOT_READY,
    VERITY_STATUS_READY,
};

pub fn create_router_with_state(state: HandlerState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/v1/claims", post(submit_claim_handler))
        .route("/v1/jobs/{job_id}", get(job_status_handler))
        .route("/v1/jobs/{job_id}/process", post(process_job_handler))
        .route("/v1/search", post(search_handler))
        .route("/v1/analytics/top-searched", get(top_searched_handler))
        .route(
            "/v1/analytics/top-misinformation",
            get(top_misinformation_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub components: ComponentStatus,
}

#[derive(serde::Serialize)]
pub struct ComponentStatus {
    pub http: &'static str,
    pub store: &'static str,
    pub store_backend: &'static str,
    pub claim_index: &'static str,
    pub embedder_mode: &'static str,
    pub verdict_mode: &'static str,
    pub search_providers: Vec<String>,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        VERITY_STATUS_HEADER,
        HeaderValue::from_static(VERITY_STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

/// Ready when the store and the claim index answer. Stub embedders and mock verdicts are
/// reported but do not block readiness.
#[tracing::instrument(skip(state))]
pub async fn ready_handler(State(state): State<HandlerState>) -> Response {
    let store_status = match state.store.health_check().await {
        Ok(()) => VERITY_STATUS_READY,
        Err(e) => {
            tracing::warn!(error = %e, "store health check failed");
            VERITY_STATUS_ERROR
        }
    };

    let index_status = match state.index.health_check().await {
        Ok(()) => VERITY_STATUS_READY,
        Err(e) => {
            tracing::warn!(error = %e, "claim index health check failed");
            VERITY_STATUS_ERROR
        }
    };

    let embedder_mode = if state.embedder.is_stub() { "stub" } else { "real" };
    let verdict_mode = if state.verdicts.is_mock() { "mock" } else { "real" };

    let components = ComponentStatus {
        http: VERITY_STATUS_READY,
        store: store_status,
        store_backend: state.store.backend(),
        claim_index: index_status,
        embedder_mode,
        verdict_mode,
        search_providers: state
            .search
            .provider_ids()
            .into_iter()
            .map(str::to_string)
            .collect(),
    };

    let is_ready =
        components.store == VERITY_STATUS_READY && components.claim_index == VERITY_STATUS_READY;

    let (status_code, status_msg) = if is_ready {
        (StatusCode::OK, VERITY_STATUS_READY)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, VERITY_STATUS_NOT_READY)
    };

    let mut headers = HeaderMap::new();
    headers.insert(VERITY_STATUS_HEADER, HeaderValue::from_static(status_msg));

    (
        status_code,
        headers,
        Json(ReadyResponse {
            status: status_msg,
            components,
        }),
    )
        .into_response()
}
