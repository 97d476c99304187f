//! Error types for gateway provisioning.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisioningError {
    /// The configuration artifact has not been written yet.
    #[error("configuration file '{}' not found; run gateway-setup first", path.display())]
    MissingConfig { path: PathBuf },

    #[error("configuration file '{}' is not valid JSON: {source}", path.display())]
    MalformedConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Parsed, but a required field is empty or unusable.
    #[error("configuration file '{}' is invalid: {reason}", path.display())]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("failed to read '{}': {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("API description '{}' is not valid JSON: {source}", path.display())]
    MalformedDescription {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A target descriptor that cannot be sent as-is (payload/type mismatch, ...).
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// Any failure reported by the gateway, identity provider or token endpoint, verbatim.
    #[error("provider error: {0}")]
    Provider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProvisioningError {
    #[must_use]
    pub fn is_missing_config(&self) -> bool {
        matches!(self, Self::MissingConfig { .. })
    }
}

pub type Result<T> = std::result::Result<T, ProvisioningError>;
