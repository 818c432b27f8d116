//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::scoring::ThresholdError;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port value is outside valid range (1-65535).
    #[error("invalid port '{value}': must be between 1 and 65535")]
    InvalidPort { value: String },

    /// Port string could not be parsed as a number.
    #[error("failed to parse port '{value}': {source}")]
    PortParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Bind address string could not be parsed.
    #[error("failed to parse bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// A numeric variable could not be parsed.
    #[error("failed to parse {name}='{value}' as a number")]
    InvalidNumber { name: &'static str, value: String },

    /// A threshold is outside the cosine range.
    #[error(transparent)]
    InvalidThreshold(#[from] ThresholdError),

    /// A limit that must be positive was zero.
    #[error("{name} must be greater than zero")]
    ZeroLimit { name: &'static str },

    /// Only one half of the pinning credentials was provided.
    #[error("both ROADPROOF_PINATA_API_KEY and ROADPROOF_PINATA_SECRET_KEY must be set")]
    IncompletePinCredentials,

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a file (when a file was expected).
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
