use serde::Serialize;

use crate::prompts::{Prompt, PromptCategory};

/// A prompt together with its similarity to the candidate image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPrompt {
    /// Row index in the prompt table.
    pub index: usize,
    pub prompt: String,
    pub category: PromptCategory,
    pub score: f32,
}

impl ScoredPrompt {
    pub fn new(index: usize, prompt: &Prompt, score: f32) -> Self {
        Self {
            index,
            prompt: prompt.text.clone(),
            category: prompt.category,
            score,
        }
    }
}

/// Why the relevance rule refused an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceFailure {
    /// Best positive score is under `MIN_VALID`.
    BelowMinValid,
    /// Best positive score does not beat best negative score.
    PositiveNotDominant,
    /// Best negative score is over `MAX_INVALID`.
    NegativeTooHigh,
}

impl RelevanceFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelevanceFailure::BelowMinValid => "below MIN_VALID",
            RelevanceFailure::PositiveNotDominant => "positive does not dominate negative",
            RelevanceFailure::NegativeTooHigh => "negative too high",
        }
    }
}

impl std::fmt::Display for RelevanceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the three-condition relevance rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelevanceDecision {
    Relevant,
    NotRelevant(RelevanceFailure),
}

impl RelevanceDecision {
    pub fn is_relevant(&self) -> bool {
        matches!(self, RelevanceDecision::Relevant)
    }

    pub fn failure(&self) -> Option<RelevanceFailure> {
        match self {
            RelevanceDecision::Relevant => None,
            RelevanceDecision::NotRelevant(failure) => Some(*failure),
        }
    }
}

/// Image scored against the prompt bank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelevanceResult {
    pub best_positive: ScoredPrompt,
    pub best_negative: ScoredPrompt,
    pub is_relevant: bool,
    /// Set when `is_relevant` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<RelevanceFailure>,
    /// Number of prompt rows scored (always the full bank).
    pub candidates_considered: usize,
}

impl RelevanceResult {
    pub fn positive_score(&self) -> f32 {
        self.best_positive.score
    }

    pub fn negative_score(&self) -> f32 {
        self.best_negative.score
    }
}

/// Image scored against the user's description.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsistencyResult {
    pub similarity: f32,
    pub is_consistent: bool,
}
