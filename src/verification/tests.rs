use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use tokio_util::sync::CancellationToken;

use super::*;
use crate::embedding::{
    ClipImageDecoder, EmbeddingError, EmbeddingProvider, EmbeddingVector, MockEmbeddingProvider,
    MockFailure, PixelTensor,
};
use crate::prompts::PromptBank;
use crate::scoring::{RelevanceFailure, Thresholds};

const DIM: usize = 16;
const DESCRIPTION: &str = "deep pothole near the bus stop on Main Street";

/// Scenario A prompt scores: best positive 0.40 (first prompt), best negative 0.10.
const ROAD_SCORES: [f32; 8] = [0.40, 0.22, 0.18, 0.10, 0.04, 0.02, 0.06, 0.08];

fn png_bytes() -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(32, 24, Rgb([90, 90, 90]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn provider(prompt_scores: [f32; 8], description_score: f32) -> Arc<MockEmbeddingProvider> {
    let bank = PromptBank::default();
    Arc::new(
        MockEmbeddingProvider::new(DIM)
            .with_prompt_scores(&bank, &prompt_scores)
            .with_text_score(DESCRIPTION, description_score),
    )
}

fn pipeline_for(provider: Arc<dyn EmbeddingProvider>) -> DecisionPipeline {
    let state = VerificationContext::initialize(
        provider,
        Arc::new(ClipImageDecoder::new()),
        PromptBank::default(),
        Thresholds::default(),
    );
    assert!(state.is_ready(), "context should initialize");
    DecisionPipeline::new(state)
}

fn submission() -> Submission {
    Submission::new(png_bytes(), DESCRIPTION)
}

#[test]
fn test_scenario_a_accepted() {
    let pipeline = pipeline_for(provider(ROAD_SCORES, 0.32));
    let verdict = pipeline
        .verify(&submission(), &CancellationToken::new())
        .unwrap();

    assert!(verdict.is_accepted());
    assert!((verdict.similarity().unwrap() - 0.32).abs() < 1e-5);
    assert_eq!(
        verdict.matched_positive_prompt(),
        Some("a photo of a damaged road with potholes")
    );
    assert!((verdict.positive_score().unwrap() - 0.40).abs() < 1e-5);
    assert_eq!(verdict.best_negative_prompt(), Some("a photo of a dog"));
    assert!((verdict.negative_score().unwrap() - 0.10).abs() < 1e-5);
}

#[test]
fn test_scenario_b_below_min_valid() {
    let scores = [0.20, 0.15, 0.12, 0.05, 0.01, 0.02, 0.03, 0.04];
    let mock = provider(scores, 0.32);
    let pipeline = pipeline_for(mock.clone());
    let verdict = pipeline
        .verify(&submission(), &CancellationToken::new())
        .unwrap();

    assert_eq!(verdict.rejection_stage(), Some(RejectionStage::Relevance));
    assert_eq!(verdict.reason(), Some("below MIN_VALID"));
    assert_eq!(
        verdict.relevance().unwrap().failure,
        Some(RelevanceFailure::BelowMinValid)
    );
    assert_eq!(verdict.similarity(), None);
}

#[test]
fn test_scenario_c_negative_too_high() {
    let scores = [0.35, 0.20, 0.10, 0.05, 0.30, 0.02, 0.03, 0.04];
    let pipeline = pipeline_for(provider(scores, 0.32));
    let verdict = pipeline
        .verify(&submission(), &CancellationToken::new())
        .unwrap();

    assert_eq!(verdict.rejection_stage(), Some(RejectionStage::Relevance));
    assert_eq!(verdict.reason(), Some("negative too high"));
    assert_eq!(
        verdict.best_negative_prompt(),
        Some("a photo of an animal on the road")
    );
}

#[test]
fn test_scenario_d_description_mismatch() {
    let pipeline = pipeline_for(provider(ROAD_SCORES, 0.15));
    let verdict = pipeline
        .verify(&submission(), &CancellationToken::new())
        .unwrap();

    assert_eq!(verdict.rejection_stage(), Some(RejectionStage::Consistency));
    assert!((verdict.similarity().unwrap() - 0.15).abs() < 1e-5);
    assert!(verdict.relevance().unwrap().is_relevant);
}

#[test]
fn test_scenario_e_unavailable_provider() {
    let mock = Arc::new(MockEmbeddingProvider::unavailable(DIM));
    let state = VerificationContext::initialize(
        mock.clone(),
        Arc::new(ClipImageDecoder::new()),
        PromptBank::default(),
        Thresholds::default(),
    );
    assert!(matches!(state, ModelState::Unavailable { .. }));

    let pipeline = DecisionPipeline::new(state);
    for _ in 0..3 {
        let verdict = pipeline
            .verify(&submission(), &CancellationToken::new())
            .unwrap();
        assert_eq!(
            verdict.rejection_stage(),
            Some(RejectionStage::ModelUnavailable)
        );
    }
    assert_eq!(mock.image_calls(), 0);
    assert_eq!(mock.text_calls(), 0);
}

#[test]
fn test_initializing_state_rejects_without_decoding() {
    let pipeline = DecisionPipeline::new(ModelState::Initializing);
    // Not an image at all; decode would fail if it ran.
    let verdict = pipeline
        .verify(
            &Submission::new(b"garbage".to_vec(), DESCRIPTION),
            &CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(
        verdict.rejection_stage(),
        Some(RejectionStage::ModelUnavailable)
    );
}

#[test]
fn test_relevance_failure_skips_text_encoding() {
    let scores = [0.20, 0.15, 0.12, 0.05, 0.01, 0.02, 0.03, 0.04];
    let mock = provider(scores, 0.32);
    let pipeline = pipeline_for(mock.clone());
    // Building the prompt table is the only text batch so far.
    assert_eq!(mock.text_calls(), 1);

    pipeline
        .verify(&submission(), &CancellationToken::new())
        .unwrap();

    assert_eq!(mock.image_calls(), 1);
    assert_eq!(mock.text_calls(), 1);
}

#[test]
fn test_accepted_encodes_each_input_once() {
    let mock = provider(ROAD_SCORES, 0.32);
    let pipeline = pipeline_for(mock.clone());

    pipeline
        .verify(&submission(), &CancellationToken::new())
        .unwrap();

    assert_eq!(mock.image_calls(), 1);
    assert_eq!(mock.text_calls(), 2);
    assert_eq!(mock.texts_encoded(), 9);
}

#[test]
fn test_decode_failure() {
    let mock = provider(ROAD_SCORES, 0.32);
    let pipeline = pipeline_for(mock.clone());
    let verdict = pipeline
        .verify(
            &Submission::new(b"not an image".to_vec(), DESCRIPTION),
            &CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(verdict.rejection_stage(), Some(RejectionStage::Decode));
    assert!(!verdict.reason().unwrap().is_empty());
    assert_eq!(mock.image_calls(), 0);
}

#[test]
fn test_empty_image_is_decode_failure() {
    let pipeline = pipeline_for(provider(ROAD_SCORES, 0.32));
    let verdict = pipeline
        .verify(
            &Submission::new(Vec::new(), DESCRIPTION),
            &CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(verdict.rejection_stage(), Some(RejectionStage::Decode));
}

#[test]
fn test_degenerate_image_vector() {
    let bank = PromptBank::default();
    let mock = Arc::new(
        MockEmbeddingProvider::new(DIM)
            .with_prompt_scores(&bank, &ROAD_SCORES)
            .with_image_failure(MockFailure::Degenerate),
    );
    let pipeline = pipeline_for(mock);
    let verdict = pipeline
        .verify(&submission(), &CancellationToken::new())
        .unwrap();

    assert_eq!(
        verdict.rejection_stage(),
        Some(RejectionStage::DegenerateVector)
    );
}

#[test]
fn test_encoder_unavailable_mid_flight() {
    let bank = PromptBank::default();
    let mock = Arc::new(
        MockEmbeddingProvider::new(DIM)
            .with_prompt_scores(&bank, &ROAD_SCORES)
            .with_image_failure(MockFailure::Unavailable),
    );
    let pipeline = pipeline_for(mock);
    let verdict = pipeline
        .verify(&submission(), &CancellationToken::new())
        .unwrap();

    assert_eq!(
        verdict.rejection_stage(),
        Some(RejectionStage::ModelUnavailable)
    );
}

#[test]
fn test_inference_failure_is_an_error() {
    let bank = PromptBank::default();
    let mock = Arc::new(
        MockEmbeddingProvider::new(DIM)
            .with_prompt_scores(&bank, &ROAD_SCORES)
            .with_image_failure(MockFailure::Inference),
    );
    let pipeline = pipeline_for(mock);
    let err = pipeline
        .verify(&submission(), &CancellationToken::new())
        .unwrap_err();

    assert!(matches!(err, PipelineError::Embedding(_)));
}

#[test]
fn test_cancelled_before_start() {
    let mock = provider(ROAD_SCORES, 0.32);
    let pipeline = pipeline_for(mock.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = pipeline.verify(&submission(), &cancel).unwrap_err();
    assert!(err.is_aborted());
    assert_eq!(mock.image_calls(), 0);
}

#[derive(Clone, Copy, PartialEq)]
enum CancelDuring {
    ImageEncode,
    DescriptionEncode,
}

/// Cancels the token from inside an encode call, as a dropped request would.
struct CancellingProvider {
    inner: Arc<MockEmbeddingProvider>,
    cancel: CancellationToken,
    during: CancelDuring,
    fail_with: Option<fn() -> EmbeddingError>,
}

impl CancellingProvider {
    fn new(inner: Arc<MockEmbeddingProvider>, during: CancelDuring) -> Self {
        Self {
            inner,
            cancel: CancellationToken::new(),
            during,
            fail_with: None,
        }
    }

    fn failing(mut self, error: fn() -> EmbeddingError) -> Self {
        self.fail_with = Some(error);
        self
    }

    fn trip<T>(&self, result: Result<T, EmbeddingError>) -> Result<T, EmbeddingError> {
        self.cancel.cancel();
        match self.fail_with {
            Some(error) => Err(error()),
            None => result,
        }
    }
}

impl EmbeddingProvider for CancellingProvider {
    fn encode_images(&self, images: &[PixelTensor]) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
        let result = self.inner.encode_images(images);
        if self.during == CancelDuring::ImageEncode {
            return self.trip(result);
        }
        result
    }

    fn encode_texts(&self, texts: &[&str]) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
        let result = self.inner.encode_texts(texts);
        if self.during == CancelDuring::DescriptionEncode && texts == [DESCRIPTION] {
            return self.trip(result);
        }
        result
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn embedding_dim(&self) -> usize {
        self.inner.embedding_dim()
    }

    fn mode(&self) -> &'static str {
        self.inner.mode()
    }
}

fn cancelling_pipeline(provider: CancellingProvider) -> (DecisionPipeline, CancellationToken) {
    let cancel = provider.cancel.clone();
    (pipeline_for(Arc::new(provider)), cancel)
}

#[test]
fn test_cancelled_during_image_encode() {
    let mock = provider(ROAD_SCORES, 0.32);
    let (pipeline, cancel) =
        cancelling_pipeline(CancellingProvider::new(mock.clone(), CancelDuring::ImageEncode));

    let err = pipeline.verify(&submission(), &cancel).unwrap_err();
    assert!(err.is_aborted());
    assert_eq!(mock.image_calls(), 1);
    // Only the prompt table was encoded.
    assert_eq!(mock.text_calls(), 1);
}

#[test]
fn test_cancelled_during_description_encode() {
    let mock = provider(ROAD_SCORES, 0.32);
    let (pipeline, cancel) = cancelling_pipeline(CancellingProvider::new(
        mock.clone(),
        CancelDuring::DescriptionEncode,
    ));

    let err = pipeline.verify(&submission(), &cancel).unwrap_err();
    assert!(err.is_aborted());
    assert_eq!(mock.text_calls(), 2);
}

#[test]
fn test_cancellation_wins_over_encoder_errors() {
    let degenerate: fn() -> EmbeddingError = || EmbeddingError::DegenerateVector { norm: 0.0 };
    let unavailable: fn() -> EmbeddingError = || EmbeddingError::ModelUnavailable {
        reason: "unloaded mid-request".to_string(),
    };
    let inference: fn() -> EmbeddingError = || EmbeddingError::InferenceFailed {
        reason: "device lost".to_string(),
    };

    for during in [CancelDuring::ImageEncode, CancelDuring::DescriptionEncode] {
        for error in [degenerate, unavailable, inference] {
            let provider =
                CancellingProvider::new(provider(ROAD_SCORES, 0.32), during).failing(error);
            let (pipeline, cancel) = cancelling_pipeline(provider);

            let err = pipeline.verify(&submission(), &cancel).unwrap_err();
            assert!(err.is_aborted(), "{:?}", error());
        }
    }
}

#[test]
fn test_pipeline_is_stateless() {
    let pipeline = pipeline_for(provider(ROAD_SCORES, 0.32));
    let first = pipeline
        .verify(&submission(), &CancellationToken::new())
        .unwrap();
    let second = pipeline
        .verify(&submission(), &CancellationToken::new())
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_verdict_serialization() {
    let pipeline = pipeline_for(provider(ROAD_SCORES, 0.15));
    let verdict = pipeline
        .verify(&submission(), &CancellationToken::new())
        .unwrap();

    let json = serde_json::to_value(&verdict).unwrap();
    assert_eq!(json["verdict"], "rejected");
    assert_eq!(json["stage"], "consistency");
    assert_eq!(
        json["diagnostics"]["relevance"]["best_positive"]["category"],
        "positive"
    );
    assert!(json["diagnostics"].get("detail").is_none());
}

#[test]
fn test_model_slot_publish() {
    let slot = ModelSlot::default();
    assert!(!slot.is_ready());
    assert_eq!(slot.snapshot().as_str(), "initializing");

    let reader = slot.clone();
    slot.publish(ModelState::Unavailable {
        reason: "weights missing".to_string(),
    });
    assert_eq!(reader.snapshot().unavailable_reason(), Some("weights missing"));

    let state = VerificationContext::initialize(
        provider(ROAD_SCORES, 0.32),
        Arc::new(ClipImageDecoder::new()),
        PromptBank::default(),
        Thresholds::default(),
    );
    slot.publish(state);
    assert!(reader.is_ready());
    assert!(reader.snapshot().context().is_some());
}
