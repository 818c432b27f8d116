use serde::Serialize;

use crate::scoring::RelevanceResult;

/// Pipeline stage that produced a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionStage {
    Decode,
    Relevance,
    Consistency,
    ModelUnavailable,
    DegenerateVector,
}

impl RejectionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionStage::Decode => "decode",
            RejectionStage::Relevance => "relevance",
            RejectionStage::Consistency => "consistency",
            RejectionStage::ModelUnavailable => "model_unavailable",
            RejectionStage::DegenerateVector => "degenerate_vector",
        }
    }
}

impl std::fmt::Display for RejectionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whatever the pipeline had computed when it stopped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<RelevanceResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Diagnostics {
    pub fn with_detail(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::default()
        }
    }

    pub fn with_relevance(relevance: RelevanceResult) -> Self {
        Self {
            relevance: Some(relevance),
            ..Self::default()
        }
    }
}

/// Final decision for one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Accepted {
        /// Image/description cosine similarity.
        similarity: f32,
        relevance: RelevanceResult,
    },
    Rejected {
        stage: RejectionStage,
        reason: String,
        diagnostics: Diagnostics,
    },
}

impl Verdict {
    pub fn rejected(stage: RejectionStage, reason: impl Into<String>, diagnostics: Diagnostics) -> Self {
        Verdict::Rejected {
            stage,
            reason: reason.into(),
            diagnostics,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted { .. })
    }

    pub fn rejection_stage(&self) -> Option<RejectionStage> {
        match self {
            Verdict::Accepted { .. } => None,
            Verdict::Rejected { stage, .. } => Some(*stage),
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Accepted { .. } => None,
            Verdict::Rejected { reason, .. } => Some(reason),
        }
    }

    /// Image/description similarity, when the consistency stage ran.
    pub fn similarity(&self) -> Option<f32> {
        match self {
            Verdict::Accepted { similarity, .. } => Some(*similarity),
            Verdict::Rejected { diagnostics, .. } => diagnostics.similarity,
        }
    }

    /// Relevance scores, when the relevance stage ran.
    pub fn relevance(&self) -> Option<&RelevanceResult> {
        match self {
            Verdict::Accepted { relevance, .. } => Some(relevance),
            Verdict::Rejected { diagnostics, .. } => diagnostics.relevance.as_ref(),
        }
    }

    pub fn matched_positive_prompt(&self) -> Option<&str> {
        self.relevance().map(|r| r.best_positive.prompt.as_str())
    }

    pub fn positive_score(&self) -> Option<f32> {
        self.relevance().map(|r| r.positive_score())
    }

    pub fn best_negative_prompt(&self) -> Option<&str> {
        self.relevance().map(|r| r.best_negative.prompt.as_str())
    }

    pub fn negative_score(&self) -> Option<f32> {
        self.relevance().map(|r| r.negative_score())
    }
}
