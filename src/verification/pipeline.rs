use std::slice;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::context::{ModelState, VerificationContext};
use super::error::PipelineError;
use super::verdict::{Diagnostics, RejectionStage, Verdict};
use crate::constants::validate_embedding_dim;
use crate::embedding::{EmbeddingError, EmbeddingVector};

/// One photo plus the user's claim about it.
#[derive(Debug, Clone)]
pub struct Submission {
    pub image_bytes: Vec<u8>,
    pub description: String,
}

impl Submission {
    pub fn new(image_bytes: impl Into<Vec<u8>>, description: impl Into<String>) -> Self {
        Self {
            image_bytes: image_bytes.into(),
            description: description.into(),
        }
    }
}

/// Runs decode, relevance and consistency in order, stopping at the first rejection.
///
/// Stateless across calls. Encoding is blocking, so async callers should run
/// [`verify`](Self::verify) on a blocking thread.
#[derive(Debug, Clone)]
pub struct DecisionPipeline {
    state: ModelState,
}

impl DecisionPipeline {
    pub fn new(state: ModelState) -> Self {
        Self { state }
    }

    pub fn from_context(context: Arc<VerificationContext>) -> Self {
        Self::new(ModelState::Ready(context))
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    /// Produces a verdict for `submission`.
    ///
    /// `cancel` is checked around every encoder call; once cancelled the result is
    /// [`PipelineError::Aborted`], never a partial verdict.
    pub fn verify(
        &self,
        submission: &Submission,
        cancel: &CancellationToken,
    ) -> Result<Verdict, PipelineError> {
        checkpoint(cancel)?;

        let context = match &self.state {
            ModelState::Ready(context) if context.provider().is_available() => context,
            ModelState::Ready(context) => {
                return Ok(unavailable(format!(
                    "embedding provider is unavailable (mode: {})",
                    context.provider().mode()
                )));
            }
            other => {
                let reason = other.unavailable_reason().unwrap_or("model is unavailable");
                return Ok(unavailable(reason));
            }
        };

        let pixels = match context.decoder().decode(&submission.image_bytes) {
            Ok(pixels) => pixels,
            Err(e) => {
                debug!(error = %e, bytes = submission.image_bytes.len(), "Image decode failed");
                return Ok(Verdict::rejected(
                    RejectionStage::Decode,
                    e.to_string(),
                    Diagnostics::default(),
                ));
            }
        };

        checkpoint(cancel)?;
        let image = match encode_one(context.provider().encode_images(slice::from_ref(&pixels))) {
            Ok(vector) => vector,
            Err(e) => return reject_embedding(e, cancel, Diagnostics::default()),
        };
        checkpoint(cancel)?;

        if let Err(e) = validate_embedding_dim(image.dim(), context.table().dim()) {
            return Err(PipelineError::Embedding(e.into()));
        }

        let relevance = context.classifier().classify(&image, context.table());
        if let Some(failure) = relevance.failure {
            debug!(
                reason = %failure,
                positive_score = relevance.positive_score(),
                negative_score = relevance.negative_score(),
                "Rejected at relevance stage"
            );
            return Ok(Verdict::rejected(
                RejectionStage::Relevance,
                failure.as_str(),
                Diagnostics::with_relevance(relevance),
            ));
        }

        let text = match encode_one(
            context
                .provider()
                .encode_texts(&[submission.description.as_str()]),
        ) {
            Ok(vector) => vector,
            Err(e) => {
                return reject_embedding(e, cancel, Diagnostics::with_relevance(relevance));
            }
        };
        checkpoint(cancel)?;

        let consistency = context.checker().check(&image, &text);
        if !consistency.is_consistent {
            debug!(
                similarity = consistency.similarity,
                min_description_match = context.checker().min_description_match(),
                "Rejected at consistency stage"
            );
            return Ok(Verdict::rejected(
                RejectionStage::Consistency,
                "description does not match image",
                Diagnostics {
                    relevance: Some(relevance),
                    similarity: Some(consistency.similarity),
                    detail: None,
                },
            ));
        }

        info!(
            similarity = consistency.similarity,
            matched_prompt = %relevance.best_positive.prompt,
            positive_score = relevance.positive_score(),
            "Submission accepted"
        );

        Ok(Verdict::Accepted {
            similarity: consistency.similarity,
            relevance,
        })
    }
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        debug!("Verification cancelled");
        return Err(PipelineError::Aborted);
    }
    Ok(())
}

fn encode_one(
    result: Result<Vec<EmbeddingVector>, EmbeddingError>,
) -> Result<EmbeddingVector, EmbeddingError> {
    result?
        .into_iter()
        .next()
        .ok_or_else(|| EmbeddingError::InferenceFailed {
            reason: "encoder returned no vector".to_string(),
        })
}

fn unavailable(reason: impl Into<String>) -> Verdict {
    let reason = reason.into();
    warn!(reason = %reason, "Rejecting submission: model unavailable");
    Verdict::rejected(
        RejectionStage::ModelUnavailable,
        "model unavailable",
        Diagnostics::with_detail(reason),
    )
}

/// Maps encoder failures onto verdicts where one exists.
///
/// A cancelled token wins over whatever the encoder reported.
fn reject_embedding(
    error: EmbeddingError,
    cancel: &CancellationToken,
    mut diagnostics: Diagnostics,
) -> Result<Verdict, PipelineError> {
    if cancel.is_cancelled() {
        debug!(error = %error, "Encoder failed after cancellation");
        return Err(PipelineError::Aborted);
    }

    match error {
        EmbeddingError::ModelUnavailable { reason } => Ok(unavailable(reason)),
        EmbeddingError::DegenerateVector { norm } => {
            warn!(norm, "Encoder produced a degenerate vector");
            diagnostics.detail = Some(format!("vector norm {norm} cannot be normalized"));
            Ok(Verdict::rejected(
                RejectionStage::DegenerateVector,
                "degenerate embedding",
                diagnostics,
            ))
        }
        EmbeddingError::Aborted => Err(PipelineError::Aborted),
        other => Err(PipelineError::Embedding(other)),
    }
}
