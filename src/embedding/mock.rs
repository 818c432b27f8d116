//! Scripted embedding provider for tests.
//!
//! Every submitted image maps to the unit vector `e0`. Each scripted text gets its own
//! axis `e_k` blended with `e0`, so `cosine(image, text)` equals the scripted score
//! exactly and scripted texts stay independent of each other.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::error::EmbeddingError;
use super::image::PixelTensor;
use super::provider::EmbeddingProvider;
use super::vector::EmbeddingVector;
use crate::prompts::PromptBank;

/// Failure injected into `encode_images`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Degenerate,
    Inference,
    Unavailable,
}

impl MockFailure {
    fn to_error(self) -> EmbeddingError {
        match self {
            MockFailure::Degenerate => EmbeddingError::DegenerateVector { norm: 0.0 },
            MockFailure::Inference => EmbeddingError::InferenceFailed {
                reason: "scripted failure".to_string(),
            },
            MockFailure::Unavailable => EmbeddingError::ModelUnavailable {
                reason: "scripted failure".to_string(),
            },
        }
    }
}

/// Builds `score * e0 + sqrt(1 - score^2) * e_axis`.
///
/// # Panics
///
/// If `axis` is `0` or out of range, or `score` is outside `[-1, 1]`.
pub fn blend_with_anchor(dim: usize, score: f32, axis: usize) -> EmbeddingVector {
    assert!(axis > 0 && axis < dim, "axis {axis} out of range for dim {dim}");
    assert!((-1.0..=1.0).contains(&score), "score {score} outside [-1, 1]");

    let mut raw = vec![0.0f32; dim];
    raw[0] = score;
    raw[axis] = (1.0 - score * score).max(0.0).sqrt();
    if raw.iter().all(|x| *x == 0.0) {
        raw[0] = 1.0;
    }
    EmbeddingVector::normalize(raw).expect("blended vector is never zero")
}

/// The vector every mock image encodes to.
pub fn anchor(dim: usize) -> EmbeddingVector {
    let mut raw = vec![0.0f32; dim];
    raw[0] = 1.0;
    EmbeddingVector::normalize(raw).expect("anchor is never zero")
}

#[derive(Debug)]
pub struct MockEmbeddingProvider {
    dim: usize,
    available: bool,
    text_vectors: HashMap<String, EmbeddingVector>,
    next_axis: usize,
    default_text: EmbeddingVector,
    image_failure: Mutex<Option<MockFailure>>,
    image_calls: AtomicUsize,
    text_calls: AtomicUsize,
    texts_encoded: AtomicUsize,
}

impl MockEmbeddingProvider {
    /// Available provider; unscripted texts are orthogonal to every image.
    pub fn new(dim: usize) -> Self {
        assert!(dim >= 4, "mock provider needs at least 4 dimensions");
        Self {
            dim,
            available: true,
            text_vectors: HashMap::new(),
            next_axis: 1,
            default_text: blend_with_anchor(dim, 0.0, dim - 1),
            image_failure: Mutex::new(None),
            image_calls: AtomicUsize::new(0),
            text_calls: AtomicUsize::new(0),
            texts_encoded: AtomicUsize::new(0),
        }
    }

    /// Provider that reports unavailable and fails every call.
    pub fn unavailable(dim: usize) -> Self {
        Self {
            available: false,
            ..Self::new(dim)
        }
    }

    /// Scripts `cosine(image, encode(text)) == score`.
    pub fn with_text_score(mut self, text: impl Into<String>, score: f32) -> Self {
        assert!(
            self.next_axis < self.dim - 1,
            "mock provider ran out of axes"
        );
        let vector = blend_with_anchor(self.dim, score, self.next_axis);
        self.next_axis += 1;
        self.text_vectors.insert(text.into(), vector);
        self
    }

    /// Scripts one score per prompt of `bank.all()`, in order.
    pub fn with_prompt_scores(self, bank: &PromptBank, scores: &[f32]) -> Self {
        assert_eq!(
            bank.len(),
            scores.len(),
            "one score per prompt is required"
        );
        bank.all()
            .iter()
            .zip(scores)
            .fold(self, |provider, (prompt, score)| {
                provider.with_text_score(prompt.text.clone(), *score)
            })
    }

    /// Makes the next `encode_images` call fail with `failure`.
    pub fn with_image_failure(self, failure: MockFailure) -> Self {
        *self.image_failure.lock() = Some(failure);
        self
    }

    /// Number of `encode_images` calls.
    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    /// Number of `encode_texts` calls.
    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    /// Total number of individual texts encoded.
    pub fn texts_encoded(&self) -> usize {
        self.texts_encoded.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), EmbeddingError> {
        if self.available {
            Ok(())
        } else {
            Err(EmbeddingError::ModelUnavailable {
                reason: "mock provider is unavailable".to_string(),
            })
        }
    }
}

impl EmbeddingProvider for MockEmbeddingProvider {
    fn encode_images(&self, images: &[PixelTensor]) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        if let Some(failure) = self.image_failure.lock().take() {
            return Err(failure.to_error());
        }

        Ok(images.iter().map(|_| anchor(self.dim)).collect())
    }

    fn encode_texts(&self, texts: &[&str]) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.texts_encoded.fetch_add(texts.len(), Ordering::SeqCst);

        Ok(texts
            .iter()
            .map(|text| {
                self.text_vectors
                    .get(*text)
                    .cloned()
                    .unwrap_or_else(|| self.default_text.clone())
            })
            .collect())
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn embedding_dim(&self) -> usize {
        self.dim
    }

    fn mode(&self) -> &'static str {
        if self.available { "mock" } else { "unavailable" }
    }
}
