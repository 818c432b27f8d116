//! Image decoding for the CLIP vision tower.
//!
//! Pipeline:
//! 1. Decode bytes (format sniffed from content: PNG, JPEG, WebP, GIF, ...)
//! 2. Resize-to-fill 224x224 (center crop), bilinear
//! 3. Convert to RGB
//! 4. Normalize with CLIP mean/std, laid out channel-first

use image::{DynamicImage, GenericImageView};
use thiserror::Error;

use crate::constants::{CLIP_IMAGE_SIZE, CLIP_MEAN, CLIP_STD};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("image payload is empty")]
    Empty,

    #[error("malformed image: {reason}")]
    Malformed { reason: String },

    #[error("image has zero dimensions")]
    ZeroDimensions,

    #[error("pixel tensor has {actual} values, expected {expected}")]
    InvalidTensor { expected: usize, actual: usize },
}

/// Normalized `3 x size x size` pixel tensor (channel-first, row-major).
#[derive(Debug, Clone, PartialEq)]
pub struct PixelTensor {
    data: Vec<f32>,
    size: u32,
}

impl PixelTensor {
    /// Wraps already-normalized CHW data.
    pub fn from_chw(data: Vec<f32>, size: u32) -> Result<Self, DecodeError> {
        let expected = Self::len_for(size);
        if size == 0 {
            return Err(DecodeError::ZeroDimensions);
        }
        if data.len() != expected {
            return Err(DecodeError::InvalidTensor {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data, size })
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Side length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Shape as `(channels, height, width)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (3, self.size as usize, self.size as usize)
    }

    fn len_for(size: u32) -> usize {
        3 * size as usize * size as usize
    }
}

/// Turns raw upload bytes into something the encoder can consume.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<PixelTensor, DecodeError>;
}

/// CLIP preprocessing (resize-to-fill, RGB, mean/std normalization).
#[derive(Debug, Clone)]
pub struct ClipImageDecoder {
    target_size: u32,
    mean: [f32; 3],
    std: [f32; 3],
}

impl Default for ClipImageDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipImageDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            target_size: CLIP_IMAGE_SIZE,
            mean: CLIP_MEAN,
            std: CLIP_STD,
        }
    }

    /// Decoder with a non-default side length (tests use small sizes).
    #[must_use]
    pub fn with_target_size(mut self, target_size: u32) -> Self {
        self.target_size = target_size;
        self
    }

    #[must_use]
    pub const fn target_size(&self) -> u32 {
        self.target_size
    }

    fn load(&self, bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
        let img = image::load_from_memory(bytes).map_err(|e| {
            tracing::debug!(error = %e, "Failed to decode submitted image");
            DecodeError::Malformed {
                reason: e.to_string(),
            }
        })?;

        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::ZeroDimensions);
        }

        Ok(img)
    }
}

impl ImageDecoder for ClipImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<PixelTensor, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let img = self.load(bytes)?;
        let size = self.target_size;

        let rgb = img
            .resize_to_fill(size, size, image::imageops::FilterType::Triangle)
            .to_rgb8();

        let plane = size as usize * size as usize;
        let mut data = vec![0.0f32; 3 * plane];

        for (x, y, pixel) in rgb.enumerate_pixels() {
            let offset = y as usize * size as usize + x as usize;
            for channel in 0..3 {
                let value = f32::from(pixel[channel]) / 255.0;
                data[channel * plane + offset] = (value - self.mean[channel]) / self.std[channel];
            }
        }

        PixelTensor::from_chw(data, size)
    }
}
