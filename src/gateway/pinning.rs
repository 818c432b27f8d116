//! Content pinning for accepted submissions.
//!
//! [`PinataPinner`] publishes to the Pinata pinning API. [`DryRunPinner`] computes a local
//! BLAKE3 identifier instead and never touches the network; it is selected when no
//! credentials are configured.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, PinCredentials};
use crate::hashing::{content_id, named_content_id};

const PIN_FILE_PATH: &str = "/pinning/pinFileToIPFS";
const PIN_JSON_PATH: &str = "/pinning/pinJSONToIPFS";
const INITIAL_BACKOFF_MS: u64 = 200;
const MAX_BACKOFF_MS: u64 = 2_000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PinError {
    #[error("pin request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("pin service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("pin service response has no content id")]
    MissingContentId,

    #[error("pin payload could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PinError {
    /// Transport failures, throttling and server errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            PinError::Transport(_) => true,
            PinError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            PinError::MissingContentId | PinError::Serialization(_) => false,
        }
    }
}

/// Publishes content and returns its content id.
#[async_trait]
pub trait Pinner: Send + Sync {
    async fn pin_file(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, PinError>;

    async fn pin_json(&self, name: &str, value: &serde_json::Value) -> Result<String, PinError>;

    /// `"pinata"` or `"dry_run"`.
    fn mode(&self) -> &'static str;
}

/// Picks the pinner the configuration asks for.
pub fn pinner_from_config(config: &Config) -> Result<Box<dyn Pinner>, PinError> {
    match &config.pin_credentials {
        Some(credentials) => Ok(Box::new(PinataPinner::new(
            &config.pinata_url,
            credentials.clone(),
            config.pin_max_attempts,
        )?)),
        None => {
            warn!("No pinning credentials configured, accepted uploads are not published");
            Ok(Box::new(DryRunPinner::new()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PinataPinner {
    client: reqwest::Client,
    base_url: String,
    credentials: PinCredentials,
    max_attempts: u32,
}

impl PinataPinner {
    pub fn new(
        base_url: &str,
        credentials: PinCredentials,
        max_attempts: u32,
    ) -> Result<Self, PinError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            max_attempts: max_attempts.max(1),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("pinata_api_key", &self.credentials.api_key)
            .header("pinata_secret_api_key", &self.credentials.secret_key)
    }

    async fn send(request: reqwest::RequestBuilder) -> Result<String, PinError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PinError::Status { status, body });
        }

        let parsed: PinResponse = response.json().await?;
        parsed
            .ipfs_hash
            .filter(|cid| !cid.is_empty())
            .ok_or(PinError::MissingContentId)
    }

    /// Runs `attempt` until it succeeds, fails permanently, or attempts run out.
    async fn with_retry<F, Fut>(&self, operation: &str, mut attempt: F) -> Result<String, PinError>
    where
        F: FnMut() -> Result<Fut, PinError>,
        Fut: Future<Output = Result<String, PinError>>,
    {
        let mut backoff_ms = INITIAL_BACKOFF_MS;
        let mut tries = 0;

        loop {
            tries += 1;
            match attempt()?.await {
                Ok(cid) => {
                    if tries > 1 {
                        debug!(operation, attempt = tries, "Pin succeeded after retry");
                    }
                    return Ok(cid);
                }
                Err(e) if e.is_retryable() && tries < self.max_attempts => {
                    warn!(
                        operation,
                        attempt = tries,
                        backoff_ms,
                        error = %e,
                        "Pin attempt failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
                }
                Err(e) => {
                    warn!(operation, attempt = tries, error = %e, "Pin failed");
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl Pinner for PinataPinner {
    async fn pin_file(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, PinError> {
        let cid = self
            .with_retry("pin_file", || {
                let mut part = Part::bytes(bytes.clone()).file_name(name.to_string());
                if let Some(mime) = content_type {
                    part = part.mime_str(mime)?;
                }
                let request = self
                    .authorized(self.client.post(self.url(PIN_FILE_PATH)))
                    .multipart(Form::new().part("file", part));
                Ok(Self::send(request))
            })
            .await?;

        info!(name, cid = %cid, "Pinned file");
        Ok(cid)
    }

    async fn pin_json(&self, name: &str, value: &serde_json::Value) -> Result<String, PinError> {
        let body = serde_json::json!({
            "pinataContent": value,
            "pinataMetadata": { "name": name },
        });

        let cid = self
            .with_retry("pin_json", || {
                let request = self
                    .authorized(self.client.post(self.url(PIN_JSON_PATH)))
                    .json(&body);
                Ok(Self::send(request))
            })
            .await?;

        info!(name, cid = %cid, "Pinned metadata");
        Ok(cid)
    }

    fn mode(&self) -> &'static str {
        "pinata"
    }
}

/// Local-only pinner: content ids are BLAKE3 digests, nothing is uploaded.
#[derive(Debug, Default)]
pub struct DryRunPinner {
    pins: AtomicUsize,
}

impl DryRunPinner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pins performed so far.
    pub fn pin_count(&self) -> usize {
        self.pins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Pinner for DryRunPinner {
    async fn pin_file(
        &self,
        name: &str,
        bytes: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<String, PinError> {
        self.pins.fetch_add(1, Ordering::SeqCst);
        let cid = named_content_id(name, &bytes);
        debug!(name, cid = %cid, "Dry-run pin (file)");
        Ok(cid)
    }

    async fn pin_json(&self, name: &str, value: &serde_json::Value) -> Result<String, PinError> {
        self.pins.fetch_add(1, Ordering::SeqCst);
        let cid = content_id(&serde_json::to_vec(value)?);
        debug!(name, cid = %cid, "Dry-run pin (json)");
        Ok(cid)
    }

    fn mode(&self) -> &'static str {
        "dry_run"
    }
}
