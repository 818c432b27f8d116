//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `ROADPROOF_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_MAX_INVALID, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_MIN_DESCRIPTION_MATCH,
    DEFAULT_MIN_VALID,
};
use crate::scoring::Thresholds;

/// Default pinning API base used when `ROADPROOF_PINATA_URL` is not set.
pub const DEFAULT_PINATA_URL: &str = "https://api.pinata.cloud";

/// Default public gateway used to build content URLs.
pub const DEFAULT_PIN_GATEWAY_URL: &str = "https://gateway.pinata.cloud/ipfs";

/// Default number of attempts per pin request.
pub const DEFAULT_PIN_MAX_ATTEMPTS: u32 = 3;

/// API key pair for the pinning service.
#[derive(Clone, PartialEq, Eq)]
pub struct PinCredentials {
    pub api_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for PinCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinCredentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `ROADPROOF_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `5001`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// CLIP model directory (`model.safetensors` + `tokenizer.json`).
    /// Without it (and without the stub), verification is unavailable.
    pub model_path: Option<PathBuf>,

    /// Use the deterministic stub encoder instead of real weights. Testing only.
    pub stub_embedder: bool,

    /// Run the encoder on CPU even when a GPU backend is compiled in.
    pub force_cpu: bool,

    /// Optional JSON prompt bank replacing the built-in phrases.
    pub prompts_path: Option<PathBuf>,

    /// Admission thresholds.
    pub thresholds: Thresholds,

    /// Request body limit for uploads. Default: 10 MiB.
    pub max_upload_bytes: usize,

    /// Pinning credentials; `None` selects dry-run pinning.
    pub pin_credentials: Option<PinCredentials>,

    /// Pinning API base URL.
    pub pinata_url: String,

    /// Gateway prefix for content URLs.
    pub pin_gateway_url: String,

    /// Attempts per pin request (first try included).
    pub pin_max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5001,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            model_path: None,
            stub_embedder: false,
            force_cpu: false,
            prompts_path: None,
            thresholds: Thresholds::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            pin_credentials: None,
            pinata_url: DEFAULT_PINATA_URL.to_string(),
            pin_gateway_url: DEFAULT_PIN_GATEWAY_URL.to_string(),
            pin_max_attempts: DEFAULT_PIN_MAX_ATTEMPTS,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "ROADPROOF_PORT";
    const ENV_BIND_ADDR: &'static str = "ROADPROOF_BIND_ADDR";
    const ENV_MODEL_PATH: &'static str = "ROADPROOF_MODEL_PATH";
    const ENV_STUB_EMBEDDER: &'static str = "ROADPROOF_STUB_EMBEDDER";
    const ENV_FORCE_CPU: &'static str = "ROADPROOF_FORCE_CPU";
    const ENV_PROMPTS_PATH: &'static str = "ROADPROOF_PROMPTS_PATH";
    const ENV_MIN_VALID: &'static str = "ROADPROOF_MIN_VALID";
    const ENV_MAX_INVALID: &'static str = "ROADPROOF_MAX_INVALID";
    const ENV_MIN_DESCRIPTION_MATCH: &'static str = "ROADPROOF_MIN_DESCRIPTION_MATCH";
    const ENV_MAX_UPLOAD_BYTES: &'static str = "ROADPROOF_MAX_UPLOAD_BYTES";
    const ENV_PINATA_API_KEY: &'static str = "ROADPROOF_PINATA_API_KEY";
    const ENV_PINATA_SECRET_KEY: &'static str = "ROADPROOF_PINATA_SECRET_KEY";
    const ENV_PINATA_URL: &'static str = "ROADPROOF_PINATA_URL";
    const ENV_PIN_GATEWAY_URL: &'static str = "ROADPROOF_PIN_GATEWAY_URL";
    const ENV_PIN_MAX_ATTEMPTS: &'static str = "ROADPROOF_PIN_MAX_ATTEMPTS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let model_path = Self::parse_optional_path_from_env(Self::ENV_MODEL_PATH);
        let stub_embedder = Self::parse_flag_from_env(Self::ENV_STUB_EMBEDDER);
        let force_cpu = Self::parse_flag_from_env(Self::ENV_FORCE_CPU);
        let prompts_path = Self::parse_optional_path_from_env(Self::ENV_PROMPTS_PATH);

        let thresholds = Thresholds {
            min_valid: Self::parse_number_from_env(Self::ENV_MIN_VALID, DEFAULT_MIN_VALID)?,
            max_invalid: Self::parse_number_from_env(Self::ENV_MAX_INVALID, DEFAULT_MAX_INVALID)?,
            min_description_match: Self::parse_number_from_env(
                Self::ENV_MIN_DESCRIPTION_MATCH,
                DEFAULT_MIN_DESCRIPTION_MATCH,
            )?,
        };

        let max_upload_bytes =
            Self::parse_number_from_env(Self::ENV_MAX_UPLOAD_BYTES, defaults.max_upload_bytes)?;

        let pin_credentials = match (
            Self::parse_optional_string_from_env(Self::ENV_PINATA_API_KEY),
            Self::parse_optional_string_from_env(Self::ENV_PINATA_SECRET_KEY),
        ) {
            (Some(api_key), Some(secret_key)) => Some(PinCredentials {
                api_key,
                secret_key,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompletePinCredentials),
        };

        let pinata_url = Self::parse_string_from_env(Self::ENV_PINATA_URL, defaults.pinata_url);
        let pin_gateway_url =
            Self::parse_string_from_env(Self::ENV_PIN_GATEWAY_URL, defaults.pin_gateway_url);
        let pin_max_attempts =
            Self::parse_number_from_env(Self::ENV_PIN_MAX_ATTEMPTS, defaults.pin_max_attempts)?;

        Ok(Self {
            port,
            bind_addr,
            model_path,
            stub_embedder,
            force_cpu,
            prompts_path,
            thresholds,
            max_upload_bytes,
            pin_credentials,
            pinata_url,
            pin_gateway_url,
            pin_max_attempts,
        })
    }

    /// Validates paths, thresholds and limits (does not load anything).
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;

        if self.max_upload_bytes == 0 {
            return Err(ConfigError::ZeroLimit {
                name: Self::ENV_MAX_UPLOAD_BYTES,
            });
        }
        if self.pin_max_attempts == 0 {
            return Err(ConfigError::ZeroLimit {
                name: Self::ENV_PIN_MAX_ATTEMPTS,
            });
        }

        if let Some(ref path) = self.model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if let Some(ref path) = self.prompts_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Whether pins go to the real service.
    pub fn pinning_enabled(&self) -> bool {
        self.pin_credentials.is_some()
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        Self::parse_optional_string_from_env(var_name).map(PathBuf::from)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        Self::parse_optional_string_from_env(var_name).unwrap_or(default)
    }

    fn parse_flag_from_env(var_name: &str) -> bool {
        env::var(var_name)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false)
    }

    fn parse_number_from_env<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
        match Self::parse_optional_string_from_env(name) {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { name, value }),
            None => Ok(default),
        }
    }
}
