use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::PromptBankError;

/// Phrases describing admissible evidence (damaged pavement).
pub const DEFAULT_POSITIVE_PROMPTS: [&str; 3] = [
    "a photo of a damaged road with potholes",
    "a photo of a broken or cracked road surface",
    "a photo of a road with a big pothole full of water",
];

/// Phrases describing common false positives.
pub const DEFAULT_NEGATIVE_PROMPTS: [&str; 5] = [
    "a photo of a dog",
    "a photo of an animal on the road",
    "a selfie of a person",
    "a random indoor scene",
    "a park or trees",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptCategory {
    Positive,
    Negative,
}

impl PromptCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptCategory::Positive => "positive",
            PromptCategory::Negative => "negative",
        }
    }
}

impl std::fmt::Display for PromptCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub text: String,
    pub category: PromptCategory,
}

impl Prompt {
    pub fn positive(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: PromptCategory::Positive,
        }
    }

    pub fn negative(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: PromptCategory::Negative,
        }
    }
}

/// On-disk form: `{ "positive": [...], "negative": [...] }`.
#[derive(Debug, Deserialize)]
struct PromptFile {
    positive: Vec<String>,
    negative: Vec<String>,
}

/// Ordered prompt catalog, fixed once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBank {
    prompts: Vec<Prompt>,
    positive_count: usize,
}

impl Default for PromptBank {
    fn default() -> Self {
        Self {
            prompts: DEFAULT_POSITIVE_PROMPTS
                .iter()
                .map(|t| Prompt::positive(*t))
                .chain(DEFAULT_NEGATIVE_PROMPTS.iter().map(|t| Prompt::negative(*t)))
                .collect(),
            positive_count: DEFAULT_POSITIVE_PROMPTS.len(),
        }
    }
}

impl PromptBank {
    /// Builds a bank; both partitions must be non-empty and no phrase may be blank.
    pub fn new<P, N>(positives: P, negatives: N) -> Result<Self, PromptBankError>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        let positives: Vec<Prompt> = positives.into_iter().map(Prompt::positive).collect();
        let negatives: Vec<Prompt> = negatives.into_iter().map(Prompt::negative).collect();

        if positives.is_empty() {
            return Err(PromptBankError::EmptyCategory {
                category: PromptCategory::Positive.as_str(),
            });
        }
        if negatives.is_empty() {
            return Err(PromptBankError::EmptyCategory {
                category: PromptCategory::Negative.as_str(),
            });
        }

        let positive_count = positives.len();
        let prompts: Vec<Prompt> = positives.into_iter().chain(negatives).collect();

        if let Some(index) = prompts.iter().position(|p| p.text.trim().is_empty()) {
            return Err(PromptBankError::BlankPrompt { index });
        }

        Ok(Self {
            prompts,
            positive_count,
        })
    }

    /// Loads a bank from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, PromptBankError> {
        let content = std::fs::read_to_string(path).map_err(|source| PromptBankError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: PromptFile =
            serde_json::from_str(&content).map_err(|source| PromptBankError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::new(file.positive, file.negative)
    }

    pub fn positives(&self) -> &[Prompt] {
        &self.prompts[..self.positive_count]
    }

    pub fn negatives(&self) -> &[Prompt] {
        &self.prompts[self.positive_count..]
    }

    /// Positives then negatives. Row `i` of the embedding table belongs to `all()[i]`.
    pub fn all(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn positive_count(&self) -> usize {
        self.positive_count
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.prompts.iter().map(|p| p.text.as_str()).collect()
    }
}
