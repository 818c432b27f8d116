//! Cross-cutting, shared constants.
//!
//! Thresholds here are defaults only. [`crate::config::Config`] reads overrides from the
//! environment and hands them to the scoring stages through [`crate::scoring::Thresholds`].
//!
//! # Dimension Invariants
//!
//! Every vector compared by the scoring stages must come from the same encoder. The
//! ViT-B/32 projection dimension is the compile-time default; use
//! [`validate_embedding_dim`] at module boundaries when a table or provider reports its own.

/// Output dimension of the CLIP ViT-B/32 joint embedding space.
pub const DEFAULT_EMBEDDING_DIM: usize = 512;

/// Allowed deviation from unit norm for a normalized embedding.
pub const UNIT_NORM_TOLERANCE: f32 = 1e-5;

/// Minimum best-positive prompt score for an image to look like road damage.
pub const DEFAULT_MIN_VALID: f32 = 0.30;

/// Maximum best-negative prompt score tolerated (dogs, selfies, foliage...).
pub const DEFAULT_MAX_INVALID: f32 = 0.25;

/// Minimum image/description similarity for the description to count as matching.
pub const DEFAULT_MIN_DESCRIPTION_MATCH: f32 = 0.28;

/// CLIP text encoder context length.
pub const CLIP_MAX_TOKENS: usize = 77;

/// CLIP image input size (224x224 pixels).
pub const CLIP_IMAGE_SIZE: u32 = 224;

/// CLIP RGB normalization mean values.
pub const CLIP_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// CLIP RGB normalization standard deviation values.
pub const CLIP_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_1];

/// Default upload limit for a submitted photo (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Error returned when two embedding sources disagree on dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimValidationError {
    /// Embedding dimension cannot be zero.
    ZeroDimension,
    /// Runtime dimension does not match expected dimension.
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for DimValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "embedding dimension cannot be zero"),
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for DimValidationError {}

/// Validates that a runtime embedding dimension matches the expected dimension.
///
/// # Example
///
/// ```
/// use roadproof::constants::{validate_embedding_dim, DEFAULT_EMBEDDING_DIM};
///
/// validate_embedding_dim(512, DEFAULT_EMBEDDING_DIM).unwrap();
/// assert!(validate_embedding_dim(768, DEFAULT_EMBEDDING_DIM).is_err());
/// ```
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if expected == 0 {
        return Err(DimValidationError::ZeroDimension);
    }
    if actual != expected {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
