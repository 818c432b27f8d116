use super::error::EmbeddingError;
use super::image::PixelTensor;
use super::vector::EmbeddingVector;

/// Joint image/text encoder.
///
/// Implementations are deterministic for fixed weights and always return unit vectors.
/// While unavailable, every `encode_*` call fails with [`EmbeddingError::ModelUnavailable`].
pub trait EmbeddingProvider: Send + Sync {
    /// Encodes a batch of images, one vector per input, in order.
    fn encode_images(&self, images: &[PixelTensor]) -> Result<Vec<EmbeddingVector>, EmbeddingError>;

    /// Encodes a batch of texts, one vector per input, in order. Empty strings are allowed.
    fn encode_texts(&self, texts: &[&str]) -> Result<Vec<EmbeddingVector>, EmbeddingError>;

    /// Encodes an image and a text together, returning `(image, text)`.
    fn encode_paired(
        &self,
        text: &str,
        image: &PixelTensor,
    ) -> Result<(EmbeddingVector, EmbeddingVector), EmbeddingError> {
        let image_vec = first(self.encode_images(std::slice::from_ref(image))?)?;
        let text_vec = first(self.encode_texts(&[text])?)?;
        Ok((image_vec, text_vec))
    }

    fn is_available(&self) -> bool;

    fn embedding_dim(&self) -> usize;

    /// Short label for readiness reporting (`"model"`, `"stub"`, `"unavailable"`, ...).
    fn mode(&self) -> &'static str;
}

fn first(mut vectors: Vec<EmbeddingVector>) -> Result<EmbeddingVector, EmbeddingError> {
    if vectors.is_empty() {
        return Err(EmbeddingError::InferenceFailed {
            reason: "encoder returned no vectors".to_string(),
        });
    }
    Ok(vectors.swap_remove(0))
}
