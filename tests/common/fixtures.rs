//! Test fixtures for integration tests.

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use roadproof::{
    ClipImageDecoder, DecisionPipeline, MockEmbeddingProvider, ModelState, PromptBank,
    Thresholds, VerificationContext,
};

pub const MOCK_DIM: usize = 32;

pub const DESCRIPTION: &str = "pothole filled with rainwater outside the school gate";

/// Best positive 0.40 on the first prompt, best negative 0.10 on "a photo of a dog".
pub const ROAD_SCORES: [f32; 8] = [0.40, 0.24, 0.19, 0.10, 0.07, 0.03, 0.05, 0.02];

/// Positives too weak to pass.
pub const WEAK_SCORES: [f32; 8] = [0.20, 0.12, 0.15, 0.05, 0.01, 0.02, 0.03, 0.04];

/// Positive wins but a negative is above `MAX_INVALID`.
pub const NOISY_SCORES: [f32; 8] = [0.35, 0.31, 0.22, 0.12, 0.30, 0.05, 0.04, 0.01];

/// Encodes a flat grey PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_pixel(width, height, Rgb([96, 92, 88]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Builds a mock-backed pipeline with scripted prompt and description scores.
pub struct ScenarioBuilder {
    bank: PromptBank,
    prompt_scores: Vec<f32>,
    description_score: f32,
    thresholds: Thresholds,
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self {
            bank: PromptBank::default(),
            prompt_scores: ROAD_SCORES.to_vec(),
            description_score: 0.32,
            thresholds: Thresholds::default(),
        }
    }
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bank(mut self, bank: PromptBank) -> Self {
        self.bank = bank;
        self
    }

    pub fn prompt_scores(mut self, scores: &[f32]) -> Self {
        self.prompt_scores = scores.to_vec();
        self
    }

    pub fn description_score(mut self, score: f32) -> Self {
        self.description_score = score;
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn provider(&self) -> Arc<MockEmbeddingProvider> {
        Arc::new(
            MockEmbeddingProvider::new(MOCK_DIM)
                .with_prompt_scores(&self.bank, &self.prompt_scores)
                .with_text_score(DESCRIPTION, self.description_score),
        )
    }

    pub fn model_state(&self, provider: Arc<MockEmbeddingProvider>) -> ModelState {
        VerificationContext::initialize(
            provider,
            Arc::new(ClipImageDecoder::new()),
            self.bank.clone(),
            self.thresholds,
        )
    }

    /// Pipeline plus the provider so tests can inspect call counts.
    pub fn build(self) -> (DecisionPipeline, Arc<MockEmbeddingProvider>) {
        let provider = self.provider();
        let state = self.model_state(provider.clone());
        (DecisionPipeline::new(state), provider)
    }
}
