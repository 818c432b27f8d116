use tracing::debug;

use super::thresholds::Thresholds;
use super::types::{RelevanceDecision, RelevanceFailure, RelevanceResult, ScoredPrompt};
use crate::embedding::{EmbeddingVector, cosine_similarity};
use crate::prompts::PromptEmbeddingTable;

/// Three-condition admission rule over already-computed scores.
///
/// Conditions are checked in order and the first failure is reported:
/// 1. `best_positive >= min_valid`
/// 2. `best_positive > best_negative`
/// 3. `best_negative <= max_invalid`
pub fn evaluate_relevance(
    best_positive: f32,
    best_negative: f32,
    thresholds: &Thresholds,
) -> RelevanceDecision {
    if best_positive.is_nan() || best_positive < thresholds.min_valid {
        return RelevanceDecision::NotRelevant(RelevanceFailure::BelowMinValid);
    }
    if best_negative.is_nan() || best_positive <= best_negative {
        return RelevanceDecision::NotRelevant(RelevanceFailure::PositiveNotDominant);
    }
    if best_negative > thresholds.max_invalid {
        return RelevanceDecision::NotRelevant(RelevanceFailure::NegativeTooHigh);
    }
    RelevanceDecision::Relevant
}

/// Index and value of the maximum; ties go to the lowest index.
///
/// `scores` must be non-empty ([`PromptBank`](crate::prompts::PromptBank) guarantees both
/// partitions are).
fn first_max(scores: &[f32]) -> (usize, f32) {
    let mut best = (0, scores[0]);
    for (idx, &score) in scores.iter().enumerate().skip(1) {
        if score > best.1 {
            best = (idx, score);
        }
    }
    best
}

/// Scores an image against the prompt table and applies [`evaluate_relevance`].
#[derive(Debug, Clone)]
pub struct RelevanceClassifier {
    thresholds: Thresholds,
}

impl RelevanceClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn classify(&self, image: &EmbeddingVector, table: &PromptEmbeddingTable) -> RelevanceResult {
        let scores: Vec<f32> = table
            .rows()
            .iter()
            .map(|row| cosine_similarity(image, row))
            .collect();

        let split = table.positive_count();
        let prompts = table.bank().all();

        let (pos_idx, pos_score) = first_max(&scores[..split]);
        let (neg_offset, neg_score) = first_max(&scores[split..]);
        let neg_idx = split + neg_offset;

        let decision = evaluate_relevance(pos_score, neg_score, &self.thresholds);

        debug!(
            best_positive = %prompts[pos_idx].text,
            positive_score = pos_score,
            best_negative = %prompts[neg_idx].text,
            negative_score = neg_score,
            relevant = decision.is_relevant(),
            "Relevance scored"
        );

        RelevanceResult {
            best_positive: ScoredPrompt::new(pos_idx, &prompts[pos_idx], pos_score),
            best_negative: ScoredPrompt::new(neg_idx, &prompts[neg_idx], neg_score),
            is_relevant: decision.is_relevant(),
            failure: decision.failure(),
            candidates_considered: scores.len(),
        }
    }
}
