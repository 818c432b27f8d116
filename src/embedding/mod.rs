//! Embedding + model utilities.
//!
//! - [`provider`] defines the encoder seam used by the verification pipeline.
//! - [`clip`] provides the CLIP ViT-B/32 implementation.
//! - [`image`] turns uploaded bytes into normalized pixel tensors.

/// CLIP embedder.
pub mod clip;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
/// Image decoding and CLIP preprocessing.
pub mod image;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
/// Encoder trait.
pub mod provider;
/// Tokenizer loading helpers.
pub mod utils;
/// Unit-normalized vectors and cosine similarity.
pub mod vector;

pub use clip::{CLIP_EMBEDDING_DIM, ClipEmbedder, ClipEmbedderConfig};
pub use error::EmbeddingError;
pub use image::{ClipImageDecoder, DecodeError, ImageDecoder, PixelTensor};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockEmbeddingProvider, MockFailure};
pub use provider::EmbeddingProvider;
pub use vector::{EmbeddingVector, cosine_similarity};
