//! Startup wiring from [`Config`] to a published [`ModelState`].

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::embedding::{ClipEmbedder, ClipEmbedderConfig, ClipImageDecoder};
use crate::prompts::PromptBank;
use crate::verification::{ModelSlot, ModelState, VerificationContext};

/// Picks the encoder the configuration asks for.
///
/// The stub wins over a model path; with neither, the encoder is unavailable.
pub fn build_embedder(config: &Config) -> ClipEmbedder {
    if config.stub_embedder {
        warn!("ROADPROOF_STUB_EMBEDDER is set, verdicts are not meaningful");
        return ClipEmbedder::load_or_unavailable(ClipEmbedderConfig::stub());
    }

    match &config.model_path {
        Some(path) => {
            let embedder_config =
                ClipEmbedderConfig::new(path.clone()).with_force_cpu(config.force_cpu);
            ClipEmbedder::load_or_unavailable(embedder_config)
        }
        None => {
            warn!("No ROADPROOF_MODEL_PATH configured, verification is unavailable");
            ClipEmbedder::unavailable(
                ClipEmbedderConfig::default(),
                "no model path configured (set ROADPROOF_MODEL_PATH)",
            )
        }
    }
}

/// Prompt bank from `ROADPROOF_PROMPTS_PATH`, or the built-in phrases.
pub fn load_prompt_bank(config: &Config) -> Result<PromptBank, crate::prompts::PromptBankError> {
    match &config.prompts_path {
        Some(path) => {
            let bank = PromptBank::from_json_file(path)?;
            info!(
                path = %path.display(),
                positives = bank.positive_count(),
                prompts = bank.len(),
                "Loaded prompt bank"
            );
            Ok(bank)
        }
        None => Ok(PromptBank::default()),
    }
}

/// Loads the encoder and prompt table. Blocking; run it off the async runtime.
pub fn load_model_state(config: &Config) -> ModelState {
    let bank = match load_prompt_bank(config) {
        Ok(bank) => bank,
        Err(e) => {
            warn!(error = %e, "Prompt bank could not be loaded");
            return ModelState::Unavailable {
                reason: e.to_string(),
            };
        }
    };

    VerificationContext::initialize(
        Arc::new(build_embedder(config)),
        Arc::new(ClipImageDecoder::new()),
        bank,
        config.thresholds,
    )
}

/// Loads the model on a blocking thread and publishes the result into `slot`.
pub fn spawn_model_loader(config: Config, slot: ModelSlot) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let state = load_model_state(&config);
        slot.publish(state);
    })
}
