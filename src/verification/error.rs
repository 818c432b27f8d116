use thiserror::Error;

use crate::embedding::EmbeddingError;

/// Failures that yield no verdict at all.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("verification aborted")]
    Aborted,

    #[error("encoder failure: {0}")]
    Embedding(EmbeddingError),
}

impl PipelineError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, PipelineError::Aborted)
    }
}
