use serde::Serialize;

use crate::constants::UNIT_NORM_TOLERANCE;
use crate::embedding::error::EmbeddingError;

/// L2-normalized embedding from the joint image/text space.
///
/// The only way to build one is [`EmbeddingVector::normalize`], so every instance has
/// unit norm (within [`UNIT_NORM_TOLERANCE`]). Two vectors are only comparable when they
/// come from the same encoder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    /// Divides `raw` by its Euclidean norm.
    ///
    /// Fails with [`EmbeddingError::DegenerateVector`] for empty input or a zero / non-finite
    /// norm. Never substitutes a default vector.
    pub fn normalize(raw: Vec<f32>) -> Result<Self, EmbeddingError> {
        if raw.is_empty() {
            return Err(EmbeddingError::DegenerateVector { norm: 0.0 });
        }

        let norm = raw
            .iter()
            .map(|x| f64::from(*x) * f64::from(*x))
            .sum::<f64>()
            .sqrt();

        if !norm.is_finite() || norm == 0.0 {
            return Err(EmbeddingError::DegenerateVector { norm: norm as f32 });
        }

        let normalized = raw
            .into_iter()
            .map(|x| (f64::from(x) / norm) as f32)
            .collect();

        Ok(Self(normalized))
    }

    /// Number of components.
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// Euclidean norm (1.0 up to rounding).
    pub fn norm(&self) -> f32 {
        self.0.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    pub fn is_unit(&self) -> bool {
        (self.norm() - 1.0).abs() <= UNIT_NORM_TOLERANCE
    }

    /// Raw dot product. Both operands must have the same dimension.
    pub fn dot(&self, other: &EmbeddingVector) -> f32 {
        debug_assert_eq!(self.dim(), other.dim(), "dot product of mismatched dims");
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }
}

/// Cosine similarity of two unit vectors: their dot product, clamped to `[-1, 1]`
/// to absorb rounding.
#[inline]
pub fn cosine_similarity(a: &EmbeddingVector, b: &EmbeddingVector) -> f32 {
    a.dot(b).clamp(-1.0, 1.0)
}
