//! Decision pipeline: decode, relevance, consistency.
//!
//! ```text
//! Start -> Decode -> RelevanceCheck -> ConsistencyCheck -> Accepted
//!            |             |                  |
//!            +-------------+------------------+--> Rejected { stage, reason, diagnostics }
//! ```
//!
//! The [`VerificationContext`] (encoder, decoder, prompt table, classifier, checker) is
//! built once at startup and published through a [`ModelSlot`]. Requests that arrive
//! before it is ready, or after loading failed, are rejected with
//! [`RejectionStage::ModelUnavailable`].

mod context;
mod error;
mod pipeline;
mod verdict;

#[cfg(test)]
mod tests;

pub use context::{ModelSlot, ModelState, VerificationContext};
pub use error::PipelineError;
pub use pipeline::{DecisionPipeline, Submission};
pub use verdict::{Diagnostics, RejectionStage, Verdict};
