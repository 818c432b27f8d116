//! Reference prompts the relevance stage scores images against.
//!
//! The bank is ordered: positives first, negatives second. Scores are split by position,
//! so [`PromptBank::all`] and [`PromptEmbeddingTable`] rows must stay aligned.

pub mod bank;
pub mod error;
pub mod table;


pub use bank::{
    DEFAULT_NEGATIVE_PROMPTS, DEFAULT_POSITIVE_PROMPTS, Prompt, PromptBank, PromptCategory,
};
pub use error::PromptBankError;
pub use table::PromptEmbeddingTable;
