//! CLIP ViT-B/32 embedder (safetensors + tokenizer).
//!
//! Use [`ClipEmbedderConfig::stub`] for tests/examples without model files, and
//! [`ClipEmbedder::load_or_unavailable`] at startup so a failed load leaves the
//! process running with an encoder that reports itself unavailable.

/// CLIP embedder configuration.
pub mod config;


pub use config::{CLIP_EMBEDDING_DIM, CLIP_WEIGHTS_FILE, ClipEmbedderConfig};

use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::clip::{ClipConfig, ClipModel};
use tracing::{debug, error, info, warn};

use crate::embedding::device::select_device;
use crate::embedding::error::EmbeddingError;
use crate::embedding::image::PixelTensor;
use crate::embedding::provider::EmbeddingProvider;
use crate::embedding::utils::load_tokenizer_with_truncation;
use crate::embedding::vector::EmbeddingVector;

enum EmbedderBackend {
    Model {
        model: Arc<ClipModel>,
        tokenizer: Arc<tokenizers::Tokenizer>,
        device: Device,
    },
    Stub,
    Unavailable {
        reason: String,
    },
}

/// Joint image/text encoder (supports stub and unavailable modes).
pub struct ClipEmbedder {
    backend: EmbedderBackend,
    config: ClipEmbedderConfig,
}

impl std::fmt::Debug for ClipEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipEmbedder")
            .field(
                "backend",
                &match &self.backend {
                    EmbedderBackend::Model { device, .. } => format!("Model({:?})", device),
                    EmbedderBackend::Stub => "Stub".to_string(),
                    EmbedderBackend::Unavailable { reason } => format!("Unavailable({reason})"),
                },
            )
            .field("embedding_dim", &self.config.embedding_dim)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}

impl ClipEmbedder {
    /// Loads the embedder from a config (stub mode is supported).
    pub fn load(config: ClipEmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!("CLIP encoder running in STUB mode (testing only)");
            return Ok(Self {
                backend: EmbedderBackend::Stub,
                config,
            });
        }

        if !config.weights_available() {
            return Err(EmbeddingError::ModelNotFound {
                path: config.weights_path(),
            });
        }

        if !config.tokenizer_available() {
            return Err(EmbeddingError::ModelNotFound {
                path: config.tokenizer_path.clone(),
            });
        }

        let device = select_device(config.force_cpu);
        debug!(?device, "Selected compute device for CLIP");

        let (model, tokenizer) = Self::load_model(&config, &device)?;

        info!(
            model_dir = %config.model_dir.display(),
            embedding_dim = config.embedding_dim,
            max_tokens = config.max_tokens,
            "CLIP model loaded successfully"
        );

        Ok(Self {
            backend: EmbedderBackend::Model {
                model: Arc::new(model),
                tokenizer: Arc::new(tokenizer),
                device,
            },
            config,
        })
    }

    /// Like [`load`](Self::load), but a failure yields an unavailable embedder instead of
    /// an error.
    pub fn load_or_unavailable(config: ClipEmbedderConfig) -> Self {
        match Self::load(config.clone()) {
            Ok(embedder) => embedder,
            Err(e) => {
                error!(error = %e, "Failed to load CLIP model; verification will be unavailable");
                Self::unavailable(config, e.to_string())
            }
        }
    }

    /// Builds an embedder that rejects every call with `ModelUnavailable`.
    pub fn unavailable(config: ClipEmbedderConfig, reason: impl Into<String>) -> Self {
        Self {
            backend: EmbedderBackend::Unavailable {
                reason: reason.into(),
            },
            config,
        }
    }

    fn load_model(
        config: &ClipEmbedderConfig,
        device: &Device,
    ) -> Result<(ClipModel, tokenizers::Tokenizer), EmbeddingError> {
        let tokenizer = load_tokenizer_with_truncation(&config.tokenizer_path, config.max_tokens)
            .map_err(|e| EmbeddingError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            })?;

        let clip_config = ClipConfig::vit_base_patch32();

        if config.embedding_dim != clip_config.text_config.projection_dim {
            return Err(EmbeddingError::InvalidConfig {
                reason: format!(
                    "embedding_dim ({}) does not match CLIP projection_dim ({})",
                    config.embedding_dim, clip_config.text_config.projection_dim
                ),
            });
        }

        let weights_path = config.weights_path();
        // SAFETY: the weights file is treated as read-only for the process lifetime.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device).map_err(
                |e| EmbeddingError::ModelLoadFailed {
                    reason: format!("Failed to map safetensors: {}", e),
                },
            )?
        };

        let model = ClipModel::new(vb, &clip_config).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to build CLIP model: {}", e),
            }
        })?;

        Ok((model, tokenizer))
    }

    fn unavailable_error(reason: &str) -> EmbeddingError {
        EmbeddingError::ModelUnavailable {
            reason: reason.to_string(),
        }
    }

    fn encode_images_with_model(
        &self,
        images: &[PixelTensor],
        model: &ClipModel,
        device: &Device,
    ) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
        let batch = images
            .iter()
            .map(|img| Tensor::from_slice(img.data(), img.shape(), device))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("Failed to create pixel tensor: {}", e),
            })?;

        let pixel_values = Tensor::stack(&batch, 0)?;

        debug!(batch = images.len(), "Running CLIP vision tower");

        let features = model
            .get_image_features(&pixel_values)
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("Vision forward pass failed: {}", e),
            })?
            .to_dtype(DType::F32)?
            .to_vec2::<f32>()?;

        features.into_iter().map(EmbeddingVector::normalize).collect()
    }

    fn encode_text_with_model(
        &self,
        text: &str,
        model: &ClipModel,
        tokenizer: &tokenizers::Tokenizer,
        device: &Device,
    ) -> Result<EmbeddingVector, EmbeddingError> {
        let encoding =
            tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        let tokens = encoding.get_ids();
        if tokens.is_empty() {
            return Err(EmbeddingError::TokenizationFailed {
                reason: "tokenizer produced no tokens".to_string(),
            });
        }

        debug!(
            text_len = text.len(),
            token_count = tokens.len(),
            "Running CLIP text tower"
        );

        let input_ids = Tensor::new(tokens, device)?.unsqueeze(0)?;

        let features = model
            .get_text_features(&input_ids)
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("Text forward pass failed: {}", e),
            })?
            .squeeze(0)?
            .to_dtype(DType::F32)?
            .to_vec1::<f32>()?;

        EmbeddingVector::normalize(features)
    }

    fn stub_vector<H: std::hash::Hash>(
        &self,
        domain: &str,
        value: H,
    ) -> Result<EmbeddingVector, EmbeddingError> {
        use std::hash::{DefaultHasher, Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        domain.hash(&mut hasher);
        value.hash(&mut hasher);
        let mut state = hasher.finish();

        let mut raw = Vec::with_capacity(self.config.embedding_dim);
        for _ in 0..self.config.embedding_dim {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            raw.push(value);
        }

        EmbeddingVector::normalize(raw)
    }

    fn stub_image(&self, image: &PixelTensor) -> Result<EmbeddingVector, EmbeddingError> {
        let bits: Vec<u32> = image.data().iter().map(|x| x.to_bits()).collect();
        self.stub_vector("image", bits)
    }

    /// Returns `true` if running in stub mode.
    pub fn is_stub(&self) -> bool {
        matches!(self.backend, EmbedderBackend::Stub)
    }

    /// Returns `true` if real weights are loaded.
    pub fn has_model(&self) -> bool {
        matches!(self.backend, EmbedderBackend::Model { .. })
    }

    /// Why the embedder is unavailable, if it is.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.backend {
            EmbedderBackend::Unavailable { reason } => Some(reason),
            _ => None,
        }
    }

    /// Returns the embedder configuration.
    pub fn config(&self) -> &ClipEmbedderConfig {
        &self.config
    }
}

impl EmbeddingProvider for ClipEmbedder {
    fn encode_images(&self, images: &[PixelTensor]) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
        match &self.backend {
            EmbedderBackend::Model { .. } | EmbedderBackend::Stub if images.is_empty() => {
                Ok(vec![])
            }
            EmbedderBackend::Model { model, device, .. } => {
                self.encode_images_with_model(images, model, device)
            }
            EmbedderBackend::Stub => images.iter().map(|img| self.stub_image(img)).collect(),
            EmbedderBackend::Unavailable { reason } => Err(Self::unavailable_error(reason)),
        }
    }

    fn encode_texts(&self, texts: &[&str]) -> Result<Vec<EmbeddingVector>, EmbeddingError> {
        match &self.backend {
            EmbedderBackend::Model {
                model,
                tokenizer,
                device,
            } => {
                // Sequential: per-text token lengths differ and CLIP pools at the EOS position.
                texts
                    .iter()
                    .map(|text| self.encode_text_with_model(text, model, tokenizer, device))
                    .collect()
            }
            EmbedderBackend::Stub => texts
                .iter()
                .map(|text| self.stub_vector("text", text))
                .collect(),
            EmbedderBackend::Unavailable { reason } => Err(Self::unavailable_error(reason)),
        }
    }

    fn is_available(&self) -> bool {
        !matches!(self.backend, EmbedderBackend::Unavailable { .. })
    }

    fn embedding_dim(&self) -> usize {
        self.config.embedding_dim
    }

    fn mode(&self) -> &'static str {
        match self.backend {
            EmbedderBackend::Model { .. } => "model",
            EmbedderBackend::Stub => "stub",
            EmbedderBackend::Unavailable { .. } => "unavailable",
        }
    }
}
