use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use verity::VERITY_STATUS_HEADER;
use verity::error::PipelineError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("persistence error: {0}")]
    PersistenceFailed(String),
}

impl From<PipelineError> for GatewayError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(msg) => GatewayError::InvalidRequest(msg),
            PipelineError::NotFound(msg) => GatewayError::NotFound(msg),
            PipelineError::UpstreamUnavailable(msg) => GatewayError::UpstreamUnavailable(msg),
            PipelineError::Persistence(msg) => GatewayError::PersistenceFailed(msg),
        }
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, verity_status) = match &self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            GatewayError::UpstreamUnavailable(_) => {
                (StatusCode::BAD_GATEWAY, "upstream_unavailable")
            }
            GatewayError::PersistenceFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "persistence_error")
            }
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        }

        let mut headers = HeaderMap::new();
        headers.insert(VERITY_STATUS_HEADER, HeaderValue::from_static(verity_status));

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
