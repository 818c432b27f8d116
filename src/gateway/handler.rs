use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::error::GatewayError;
use super::state::HandlerState;
use super::{
    ROADPROOF_STATUS_ACCEPTED, ROADPROOF_STATUS_HEADER, ROADPROOF_STATUS_REJECTED,
    ROADPROOF_STATUS_UNAVAILABLE,
};
use crate::hashing::fingerprint;
use crate::scoring::RelevanceResult;
use crate::verification::{DecisionPipeline, RejectionStage, Submission, Verdict};

const DEFAULT_IMAGE_NAME: &str = "upload";

/// Relevance summary in the shape clients already consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipInfo {
    pub best_valid_prompt: String,
    pub best_valid_score: f32,
    pub best_invalid_prompt: String,
    pub best_invalid_score: f32,
}

impl From<&RelevanceResult> for ClipInfo {
    fn from(result: &RelevanceResult) -> Self {
        Self {
            best_valid_prompt: result.best_positive.prompt.clone(),
            best_valid_score: result.positive_score(),
            best_invalid_prompt: result.best_negative.prompt.clone(),
            best_invalid_score: result.negative_score(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RejectionResponse {
    pub message: &'static str,
    pub stage: RejectionStage,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_info: Option<ClipInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub similarity: f32,
    pub cid: String,
    #[serde(rename = "metadataCID")]
    pub metadata_cid: String,
    pub location: String,
    pub image_url: String,
    pub clip_info: ClipInfo,
}

/// Record pinned next to the image.
#[derive(Debug, Serialize)]
pub struct PinnedMetadata<'a> {
    pub image_cid: &'a str,
    pub description: &'a str,
    pub location: &'a str,
    pub similarity_score: f32,
    pub clip_valid_prompt: &'a str,
    pub clip_valid_score: f32,
    /// Seconds since the Unix epoch.
    pub timestamp: String,
}

/// Parsed multipart form.
#[derive(Debug)]
pub(crate) struct UploadForm {
    pub image: Bytes,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub description: String,
    pub location: String,
}

pub(crate) async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, GatewayError> {
    let mut image = None;
    let mut file_name = None;
    let mut content_type = None;
    let mut description = None;
    let mut location = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("image") => {
                file_name = field.file_name().map(str::to_string);
                content_type = field.content_type().map(str::to_string);
                image = Some(field.bytes().await?);
            }
            Some("description") => {
                description = Some(field.text().await?);
            }
            Some("location") => {
                location = Some(field.text().await?);
            }
            other => debug!(field = ?other, "Ignoring unknown multipart field"),
        }
    }

    Ok(UploadForm {
        image: image.ok_or(GatewayError::MissingField("image"))?,
        file_name,
        content_type,
        description: description.ok_or(GatewayError::MissingField("description"))?,
        location: location.ok_or(GatewayError::MissingField("location"))?,
    })
}

fn status_headers(status: &'static str, submission_id: &Uuid) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ROADPROOF_STATUS_HEADER, HeaderValue::from_static(status));
    if let Ok(value) = HeaderValue::from_str(&submission_id.to_string()) {
        headers.insert("x-roadproof-submission", value);
    }
    headers
}

fn rejection_message(stage: RejectionStage) -> &'static str {
    match stage {
        RejectionStage::Decode => "Image could not be decoded",
        RejectionStage::Relevance => "Image does not look like a damaged road",
        RejectionStage::Consistency => "Description does not match image",
        RejectionStage::ModelUnavailable => "CLIP model not loaded",
        RejectionStage::DegenerateVector => "Image could not be embedded",
    }
}

pub(crate) fn rejection_response(verdict: &Verdict, submission_id: &Uuid) -> Option<Response> {
    let Verdict::Rejected { stage, reason, .. } = verdict else {
        return None;
    };

    let (status, header) = if *stage == RejectionStage::ModelUnavailable {
        (StatusCode::SERVICE_UNAVAILABLE, ROADPROOF_STATUS_UNAVAILABLE)
    } else {
        (StatusCode::BAD_REQUEST, ROADPROOF_STATUS_REJECTED)
    };

    let body = RejectionResponse {
        message: rejection_message(*stage),
        stage: *stage,
        reason: reason.clone(),
        clip_info: verdict.relevance().map(ClipInfo::from),
        similarity: verdict.similarity(),
    };

    Some((status, status_headers(header, submission_id), Json(body)).into_response())
}

fn epoch_seconds() -> String {
    let now = Utc::now();
    format!("{}.{:06}", now.timestamp(), now.timestamp_subsec_micros())
}

#[instrument(
    skip(state, multipart),
    fields(submission_id = tracing::field::Empty, image_fingerprint = tracing::field::Empty)
)]
pub async fn upload_and_verify_handler(
    State(state): State<HandlerState>,
    multipart: Multipart,
) -> Result<Response, GatewayError> {
    let submission_id = Uuid::new_v4();
    let span = tracing::Span::current();
    span.record("submission_id", tracing::field::display(&submission_id));

    let form = read_upload_form(multipart).await?;
    span.record(
        "image_fingerprint",
        tracing::field::display(format!("{:016x}", fingerprint(&form.image))),
    );
    debug!(
        bytes = form.image.len(),
        description_len = form.description.len(),
        "Upload received"
    );

    let pipeline = DecisionPipeline::new(state.model.snapshot());
    let submission = Submission::new(form.image.to_vec(), form.description.clone());

    // Dropping this request future cancels the blocking verification.
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let verdict = tokio::task::spawn_blocking(move || pipeline.verify(&submission, &cancel))
        .await
        .map_err(|e| GatewayError::InternalError(format!("verification task failed: {e}")))??;

    if let Some(response) = rejection_response(&verdict, &submission_id) {
        warn!(
            stage = ?verdict.rejection_stage(),
            reason = verdict.reason().unwrap_or_default(),
            "Submission rejected"
        );
        return Ok(response);
    }

    let Verdict::Accepted {
        similarity,
        relevance,
    } = verdict
    else {
        return Err(GatewayError::InternalError(
            "verdict is neither accepted nor rejected".to_string(),
        ));
    };

    let file_name = form.file_name.as_deref().unwrap_or(DEFAULT_IMAGE_NAME);
    let image_cid = state
        .pinner
        .pin_file(file_name, form.image.to_vec(), form.content_type.as_deref())
        .await?;

    let metadata = PinnedMetadata {
        image_cid: &image_cid,
        description: &form.description,
        location: &form.location,
        similarity_score: similarity,
        clip_valid_prompt: &relevance.best_positive.prompt,
        clip_valid_score: relevance.positive_score(),
        timestamp: epoch_seconds(),
    };
    let metadata_value = serde_json::to_value(&metadata)
        .map_err(|e| GatewayError::InternalError(format!("metadata serialization: {e}")))?;
    let metadata_cid = state
        .pinner
        .pin_json(&format!("{image_cid}-metadata"), &metadata_value)
        .await?;

    info!(
        cid = %image_cid,
        metadata_cid = %metadata_cid,
        similarity,
        pinner = state.pinner.mode(),
        "Submission accepted and pinned"
    );

    let body = AcceptedResponse {
        similarity,
        image_url: state.content_url(&image_cid),
        cid: image_cid,
        metadata_cid,
        location: form.location,
        clip_info: ClipInfo::from(&relevance),
    };

    Ok((
        StatusCode::OK,
        status_headers(ROADPROOF_STATUS_ACCEPTED, &submission_id),
        Json(body),
    )
        .into_response())
}
