//! Admission rules.
//!
//! Both stages are split in two: a pure rule over scores ([`evaluate_relevance`],
//! [`evaluate_consistency`]) and a thin wrapper that computes the scores from vectors
//! ([`RelevanceClassifier`], [`ConsistencyChecker`]). Threshold tuning only touches the
//! former.
//!
//! # Relevance
//!
//! The image is compared with every prompt in the table. The best positive and best
//! negative match are kept (ties go to the earlier prompt) and must satisfy, in order:
//! `positive >= MIN_VALID`, `positive > negative`, `negative <= MAX_INVALID`.
//!
//! # Consistency
//!
//! The image is compared with the description text; it passes when the similarity
//! reaches `MIN_DESCRIPTION_MATCH`.

pub mod consistency;
pub mod relevance;
pub mod thresholds;
pub mod types;

#[cfg(test)]
mod tests;

pub use consistency::{ConsistencyChecker, evaluate_consistency};
pub use relevance::{RelevanceClassifier, evaluate_relevance};
pub use thresholds::{ThresholdError, Thresholds};
pub use types::{
    ConsistencyResult, RelevanceDecision, RelevanceFailure, RelevanceResult, ScoredPrompt,
};
