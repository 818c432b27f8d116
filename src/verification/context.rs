use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info, warn};

use crate::embedding::{EmbeddingProvider, ImageDecoder};
use crate::prompts::{PromptBank, PromptBankError, PromptEmbeddingTable};
use crate::scoring::{ConsistencyChecker, RelevanceClassifier, Thresholds};

/// Everything a verification needs, built once and shared read-only.
pub struct VerificationContext {
    provider: Arc<dyn EmbeddingProvider>,
    decoder: Arc<dyn ImageDecoder>,
    table: PromptEmbeddingTable,
    classifier: RelevanceClassifier,
    checker: ConsistencyChecker,
}

impl std::fmt::Debug for VerificationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationContext")
            .field("provider_mode", &self.provider.mode())
            .field("prompts", &self.table.len())
            .field("thresholds", self.classifier.thresholds())
            .finish()
    }
}

impl VerificationContext {
    /// Encodes the prompt bank and assembles the context.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        decoder: Arc<dyn ImageDecoder>,
        bank: PromptBank,
        thresholds: Thresholds,
    ) -> Result<Self, PromptBankError> {
        let table = PromptEmbeddingTable::build(bank, provider.as_ref())?;
        Ok(Self {
            provider,
            decoder,
            table,
            classifier: RelevanceClassifier::new(thresholds),
            checker: ConsistencyChecker::new(thresholds.min_description_match),
        })
    }

    /// Single entry point for startup: a ready context or the reason there is none.
    pub fn initialize(
        provider: Arc<dyn EmbeddingProvider>,
        decoder: Arc<dyn ImageDecoder>,
        bank: PromptBank,
        thresholds: Thresholds,
    ) -> ModelState {
        if !provider.is_available() {
            let reason = format!("embedding provider is unavailable (mode: {})", provider.mode());
            warn!(reason = %reason, "Verification disabled");
            return ModelState::Unavailable { reason };
        }

        match Self::new(provider, decoder, bank, thresholds) {
            Ok(context) => {
                info!(
                    mode = context.provider.mode(),
                    prompts = context.table.len(),
                    min_valid = thresholds.min_valid,
                    max_invalid = thresholds.max_invalid,
                    min_description_match = thresholds.min_description_match,
                    "Verification context ready"
                );
                ModelState::Ready(Arc::new(context))
            }
            Err(e) => {
                error!(error = %e, "Failed to build prompt embedding table");
                ModelState::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    pub fn decoder(&self) -> &dyn ImageDecoder {
        self.decoder.as_ref()
    }

    pub fn table(&self) -> &PromptEmbeddingTable {
        &self.table
    }

    pub fn classifier(&self) -> &RelevanceClassifier {
        &self.classifier
    }

    pub fn checker(&self) -> &ConsistencyChecker {
        &self.checker
    }

    pub fn thresholds(&self) -> &Thresholds {
        self.classifier.thresholds()
    }
}

/// Load state of the process-wide verification context.
#[derive(Debug, Clone)]
pub enum ModelState {
    Initializing,
    Ready(Arc<VerificationContext>),
    Unavailable { reason: String },
}

impl ModelState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelState::Ready(_))
    }

    pub fn context(&self) -> Option<&Arc<VerificationContext>> {
        match self {
            ModelState::Ready(context) => Some(context),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelState::Initializing => "initializing",
            ModelState::Ready(_) => "ready",
            ModelState::Unavailable { .. } => "unavailable",
        }
    }

    /// Human-readable reason verification cannot run, if any.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            ModelState::Initializing => Some("model is still loading"),
            ModelState::Ready(_) => None,
            ModelState::Unavailable { reason } => Some(reason),
        }
    }
}

/// Shared slot written by the startup task and read per request.
#[derive(Debug, Clone)]
pub struct ModelSlot {
    inner: Arc<RwLock<ModelState>>,
}

impl Default for ModelSlot {
    fn default() -> Self {
        Self::new(ModelState::Initializing)
    }
}

impl ModelSlot {
    pub fn new(state: ModelState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub fn publish(&self, state: ModelState) {
        info!(state = state.as_str(), "Model state published");
        *self.inner.write() = state;
    }

    /// Clones the current state; the read lock is released before returning.
    pub fn snapshot(&self) -> ModelState {
        self.inner.read().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.read().is_ready()
    }
}
