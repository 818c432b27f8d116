use std::path::PathBuf;

use crate::embedding::error::EmbeddingError;

/// Default CLIP embedding dimension (ViT-B/32 projection).
pub const CLIP_EMBEDDING_DIM: usize = crate::constants::DEFAULT_EMBEDDING_DIM;

/// Weights file expected inside the model directory.
pub const CLIP_WEIGHTS_FILE: &str = "model.safetensors";

#[derive(Debug, Clone)]
/// Configuration for [`ClipEmbedder`](super::ClipEmbedder).
pub struct ClipEmbedderConfig {
    /// Directory holding `model.safetensors` and `tokenizer.json`
    /// (a local snapshot of `openai/clip-vit-base-patch32`).
    pub model_dir: PathBuf,
    /// Path to `tokenizer.json`.
    pub tokenizer_path: PathBuf,
    /// Max tokens per text (CLIP context length).
    pub max_tokens: usize,
    /// Output embedding dimension.
    pub embedding_dim: usize,
    /// Skip GPU probing.
    pub force_cpu: bool,
    /// If true, run in deterministic stub mode (no model files required).
    pub testing_stub: bool,
}

impl Default for ClipEmbedderConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::new(),
            tokenizer_path: PathBuf::new(),
            max_tokens: crate::constants::CLIP_MAX_TOKENS,
            embedding_dim: CLIP_EMBEDDING_DIM,
            force_cpu: false,
            testing_stub: false,
        }
    }
}

impl ClipEmbedderConfig {
    /// Creates a config for a model directory, expecting `tokenizer.json` inside it.
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        let model_dir = model_dir.into();
        let tokenizer_path = model_dir.join("tokenizer.json");

        Self {
            model_dir,
            tokenizer_path,
            ..Default::default()
        }
    }

    /// Skips GPU probing when `force_cpu` is set.
    pub fn with_force_cpu(mut self, force_cpu: bool) -> Self {
        self.force_cpu = force_cpu;
        self
    }

    /// Creates a stub config (no model files; produces deterministic embeddings).
    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            ..Default::default()
        }
    }

    pub fn weights_path(&self) -> PathBuf {
        self.model_dir.join(CLIP_WEIGHTS_FILE)
    }

    /// Validates required fields for non-stub mode.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.embedding_dim == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "embedding_dim must be non-zero".to_string(),
            });
        }

        if self.max_tokens == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "max_tokens must be non-zero".to_string(),
            });
        }

        if self.testing_stub {
            return Ok(());
        }

        if self.model_dir.as_os_str().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "model_dir is required (stubbing is disabled)".to_string(),
            });
        }

        if !self.model_dir.is_dir() {
            return Err(EmbeddingError::ModelNotFound {
                path: self.model_dir.clone(),
            });
        }

        Ok(())
    }

    /// Returns `true` if the weights file exists.
    pub fn weights_available(&self) -> bool {
        !self.model_dir.as_os_str().is_empty() && self.weights_path().is_file()
    }

    /// Returns `true` if the tokenizer path exists.
    pub fn tokenizer_available(&self) -> bool {
        !self.tokenizer_path.as_os_str().is_empty() && self.tokenizer_path.is_file()
    }
}
