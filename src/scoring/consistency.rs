use super::types::ConsistencyResult;
use crate::embedding::{EmbeddingVector, cosine_similarity};

/// Single-threshold rule: the description matches when `similarity >= min_description_match`.
#[inline]
pub fn evaluate_consistency(similarity: f32, min_description_match: f32) -> bool {
    similarity >= min_description_match
}

/// Scores an image vector against a description vector.
#[derive(Debug, Clone, Copy)]
pub struct ConsistencyChecker {
    min_description_match: f32,
}

impl ConsistencyChecker {
    pub fn new(min_description_match: f32) -> Self {
        Self {
            min_description_match,
        }
    }

    pub fn min_description_match(&self) -> f32 {
        self.min_description_match
    }

    pub fn check(&self, image: &EmbeddingVector, text: &EmbeddingVector) -> ConsistencyResult {
        let similarity = cosine_similarity(image, text);
        ConsistencyResult {
            similarity,
            is_consistent: evaluate_consistency(similarity, self.min_description_match),
        }
    }
}
