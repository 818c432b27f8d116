//! HTTP gateway (Axum) for submission verification and pinning.
//!
//! This module is primarily used by the `roadproof` server binary.

pub mod error;
pub mod handler;
pub mod pinning;
pub mod state;


use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{ClipInfo, upload_and_verify_handler};
pub use pinning::{DryRunPinner, PinError, PinataPinner, Pinner, pinner_from_config};
pub use state::HandlerState;

use crate::verification::ModelState;

pub const ROADPROOF_STATUS_HEADER: &str = "x-roadproof-status";
pub const ROADPROOF_STATUS_HEALTHY: &str = "healthy";
pub const ROADPROOF_STATUS_READY: &str = "ready";
pub const ROADPROOF_STATUS_NOT_READY: &str = "not_ready";
pub const ROADPROOF_STATUS_ACCEPTED: &str = "accepted";
pub const ROADPROOF_STATUS_REJECTED: &str = "rejected";
pub const ROADPROOF_STATUS_UNAVAILABLE: &str = "model_unavailable";

pub fn create_router_with_state(state: HandlerState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/upload_and_verify", post(upload_and_verify_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub components: ComponentStatus,
}

#[derive(serde::Serialize)]
pub struct ComponentStatus {
    pub http: &'static str,
    pub model: &'static str,
    pub embedder_mode: &'static str,
    pub pinner: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[tracing::instrument(skip(state))]
pub async fn health_handler(State(state): State<HandlerState>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        ROADPROOF_STATUS_HEADER,
        HeaderValue::from_static(ROADPROOF_STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse {
            status: "ok",
            model_loaded: state.model.is_ready(),
        }),
    )
        .into_response()
}

#[tracing::instrument(skip(state))]
pub async fn ready_handler(State(state): State<HandlerState>) -> Response {
    let model_state = state.model.snapshot();

    let embedder_mode = match &model_state {
        ModelState::Ready(context) => context.provider().mode(),
        ModelState::Initializing => "loading",
        ModelState::Unavailable { .. } => "unavailable",
    };

    let components = ComponentStatus {
        http: ROADPROOF_STATUS_READY,
        model: model_state.as_str(),
        embedder_mode,
        pinner: state.pinner.mode(),
        reason: model_state.unavailable_reason().map(str::to_string),
    };

    let is_ready = model_state.is_ready();
    let status_code = if is_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let status_msg = if is_ready {
        ROADPROOF_STATUS_READY
    } else {
        ROADPROOF_STATUS_NOT_READY
    };

    let mut headers = HeaderMap::new();
    headers.insert(ROADPROOF_STATUS_HEADER, HeaderValue::from_static(status_msg));

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
