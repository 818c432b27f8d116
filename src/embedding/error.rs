use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding model not found at path: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load embedding model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("embedding inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("invalid model configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The encoder failed to initialize (or has not finished initializing).
    #[error("embedding model unavailable: {reason}")]
    ModelUnavailable { reason: String },

    /// A raw embedding had a zero or non-finite norm and cannot be normalized.
    #[error("degenerate embedding vector (norm: {norm})")]
    DegenerateVector { norm: f32 },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The caller cancelled an in-flight encode.
    #[error("embedding computation aborted")]
    Aborted,
}

impl EmbeddingError {
    /// Returns `true` for errors that mean "no encoder to talk to".
    pub fn is_unavailable(&self) -> bool {
        matches!(self, EmbeddingError::ModelUnavailable { .. })
    }
}

impl From<candle_core::Error> for EmbeddingError {
    fn from(err: candle_core::Error) -> Self {
        EmbeddingError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for EmbeddingError {
    fn from(err: std::io::Error) -> Self {
        EmbeddingError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}

impl From<crate::constants::DimValidationError> for EmbeddingError {
    fn from(err: crate::constants::DimValidationError) -> Self {
        match err {
            crate::constants::DimValidationError::DimensionMismatch { expected, actual } => {
                EmbeddingError::DimensionMismatch { expected, actual }
            }
            crate::constants::DimValidationError::ZeroDimension => EmbeddingError::InvalidConfig {
                reason: err.to_string(),
            },
        }
    }
}
