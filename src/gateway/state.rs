use std::sync::Arc;

use super::pinning::Pinner;
use crate::constants::DEFAULT_MAX_UPLOAD_BYTES;
use crate::verification::ModelSlot;

#[derive(Clone)]
pub struct HandlerState {
    pub model: ModelSlot,

    pub pinner: Arc<dyn Pinner>,

    /// Gateway prefix used to build `image_url` in responses.
    pub gateway_url: String,

    pub max_upload_bytes: usize,
}

impl HandlerState {
    pub fn new(model: ModelSlot, pinner: Arc<dyn Pinner>, gateway_url: impl Into<String>) -> Self {
        Self {
            model,
            pinner,
            gateway_url: gateway_url.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn content_url(&self, cid: &str) -> String {
        format!("{}/{}", self.gateway_url.trim_end_matches('/'), cid)
    }
}
