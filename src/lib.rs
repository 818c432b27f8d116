//! Roadproof library crate (used by the server and integration tests).
//!
//! Decides whether an uploaded photo is admissible evidence of road damage before it is
//! pinned. The decision runs in three steps:
//!
//! 1. Decode the upload into a CLIP pixel tensor ([`embedding::image`]).
//! 2. Score the image against the positive and negative [`prompts`] and apply the
//!    relevance rule ([`scoring::relevance`]).
//! 3. Score the image against the user's description ([`scoring::consistency`]).
//!
//! [`verification::DecisionPipeline`] sequences the steps and returns a [`Verdict`].
//! [`gateway`] exposes it over HTTP and pins accepted uploads.
//!
//! ## Test/Mock Support
//! [`MockEmbeddingProvider`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod embedding;
pub mod gateway;
pub mod hashing;
pub mod prompts;
pub mod scoring;
pub mod startup;
pub mod verification;

pub use config::{Config, ConfigError};
pub use constants::{DimValidationError, validate_embedding_dim};
#[cfg(any(test, feature = "mock"))]
pub use embedding::{MockEmbeddingProvider, MockFailure};
pub use embedding::{
    CLIP_EMBEDDING_DIM, ClipEmbedder, ClipEmbedderConfig, ClipImageDecoder, DecodeError,
    EmbeddingError, EmbeddingProvider, EmbeddingVector, ImageDecoder, PixelTensor,
    cosine_similarity,
};
pub use prompts::{Prompt, PromptBank, PromptBankError, PromptCategory, PromptEmbeddingTable};
pub use scoring::{
    ConsistencyChecker, ConsistencyResult, RelevanceClassifier, RelevanceFailure,
    RelevanceResult, Thresholds, evaluate_consistency, evaluate_relevance,
};
pub use verification::{
    DecisionPipeline, Diagnostics, ModelSlot, ModelState, PipelineError, RejectionStage,
    Submission, Verdict, VerificationContext,
};
