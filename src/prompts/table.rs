use tracing::{debug, info};

use super::bank::{Prompt, PromptBank};
use super::error::PromptBankError;
use crate::constants::validate_embedding_dim;
use crate::embedding::{EmbeddingError, EmbeddingProvider, EmbeddingVector};

/// Prompt vectors, one row per [`PromptBank::all`] entry, encoded once.
#[derive(Debug, Clone)]
pub struct PromptEmbeddingTable {
    bank: PromptBank,
    rows: Vec<EmbeddingVector>,
    dim: usize,
}

impl PromptEmbeddingTable {
    /// Encodes every prompt in a single batch.
    pub fn build(
        bank: PromptBank,
        provider: &dyn EmbeddingProvider,
    ) -> Result<Self, PromptBankError> {
        debug!(prompts = bank.len(), "Encoding prompt bank");

        let rows = provider.encode_texts(&bank.texts())?;
        let table = Self::from_rows(bank, rows, provider.embedding_dim())?;

        info!(
            prompts = table.len(),
            positives = table.positive_count(),
            dim = table.dim(),
            "Prompt embedding table ready"
        );

        Ok(table)
    }

    /// Assembles a table from pre-computed rows, checking count and dimension.
    pub fn from_rows(
        bank: PromptBank,
        rows: Vec<EmbeddingVector>,
        dim: usize,
    ) -> Result<Self, PromptBankError> {
        if rows.len() != bank.len() {
            return Err(PromptBankError::SizeMismatch {
                expected: bank.len(),
                actual: rows.len(),
            });
        }

        for row in &rows {
            validate_embedding_dim(row.dim(), dim).map_err(EmbeddingError::from)?;
        }

        Ok(Self { bank, rows, dim })
    }

    pub fn bank(&self) -> &PromptBank {
        &self.bank
    }

    pub fn rows(&self) -> &[EmbeddingVector] {
        &self.rows
    }

    /// `(prompt, vector)` pairs in bank order.
    pub fn entries(&self) -> impl Iterator<Item = (&Prompt, &EmbeddingVector)> {
        self.bank.all().iter().zip(self.rows.iter())
    }

    pub fn positive_count(&self) -> usize {
        self.bank.positive_count()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}
