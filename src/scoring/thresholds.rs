use serde::Serialize;
use thiserror::Error;

use crate::constants::{DEFAULT_MAX_INVALID, DEFAULT_MIN_DESCRIPTION_MATCH, DEFAULT_MIN_VALID};

#[derive(Debug, Error, PartialEq)]
pub enum ThresholdError {
    #[error("{name} must be a finite value in [-1, 1], got {value}")]
    OutOfRange { name: &'static str, value: f32 },
}

/// Admission thresholds, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    /// `MIN_VALID`: best positive score must reach this.
    pub min_valid: f32,
    /// `MAX_INVALID`: best negative score must not exceed this.
    pub max_invalid: f32,
    /// `MIN_DESCRIPTION_MATCH`: image/description similarity must reach this.
    pub min_description_match: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_valid: DEFAULT_MIN_VALID,
            max_invalid: DEFAULT_MAX_INVALID,
            min_description_match: DEFAULT_MIN_DESCRIPTION_MATCH,
        }
    }
}

impl Thresholds {
    pub fn with_min_valid(mut self, value: f32) -> Self {
        self.min_valid = value;
        self
    }

    pub fn with_max_invalid(mut self, value: f32) -> Self {
        self.max_invalid = value;
        self
    }

    pub fn with_min_description_match(mut self, value: f32) -> Self {
        self.min_description_match = value;
        self
    }

    /// Cosine scores live in `[-1, 1]`; anything else can never be met (or always is).
    pub fn validate(&self) -> Result<(), ThresholdError> {
        for (name, value) in [
            ("MIN_VALID", self.min_valid),
            ("MAX_INVALID", self.max_invalid),
            ("MIN_DESCRIPTION_MATCH", self.min_description_match),
        ] {
            if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
                return Err(ThresholdError::OutOfRange { name, value });
            }
        }
        Ok(())
    }
}
