use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::EmbeddingError;

#[derive(Debug, Error)]
pub enum PromptBankError {
    #[error("prompt bank needs at least one {category} prompt")]
    EmptyCategory { category: &'static str },

    #[error("prompt #{index} is blank")]
    BlankPrompt { index: usize },

    #[error("failed to read prompt file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse prompt file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode prompt bank: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("encoder returned {actual} prompt vectors, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}
