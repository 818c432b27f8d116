use axum::{
    Json,
    extract::multipart::MultipartError,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::ROADPROOF_STATUS_HEADER;
use super::pinning::PinError;
use crate::verification::PipelineError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Malformed or oversized multipart body; `status` comes from the extractor.
    #[error("invalid request: {message}")]
    InvalidRequest { status: StatusCode, message: String },

    #[error("verification aborted")]
    Aborted,

    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("pinning failed: {0}")]
    PinFailed(#[from] PinError),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<MultipartError> for GatewayError {
    fn from(error: MultipartError) -> Self {
        GatewayError::InvalidRequest {
            status: error.status(),
            message: error.body_text(),
        }
    }
}

impl From<PipelineError> for GatewayError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::Aborted => GatewayError::Aborted,
            PipelineError::Embedding(e) => GatewayError::EmbeddingFailed(e.to_string()),
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
        let (status, roadproof_status) = match &self {
            GatewayError::MissingField(_) => (StatusCode::BAD_REQUEST, "missing_field"),
            GatewayError::InvalidRequest { status, .. }
                if *status == StatusCode::PAYLOAD_TOO_LARGE =>
            {
                (*status, "payload_too_large")
            }
            GatewayError::InvalidRequest { status, .. } => (*status, "invalid_request"),
            GatewayError::Aborted => (StatusCode::SERVICE_UNAVAILABLE, "aborted"),
            GatewayError::EmbeddingFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "embedding_error")
            }
            GatewayError::PinFailed(_) => (StatusCode::BAD_GATEWAY, "pin_error"),
            GatewayError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            ROADPROOF_STATUS_HEADER,
            HeaderValue::from_static(roadproof_status),
        );

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
