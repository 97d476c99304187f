//! Error types for `agentcore-openapi-convert`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input is not well-formed YAML.
    #[error("failed to parse YAML from '{location}': {source}")]
    Yaml {
        location: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A YAML value has no JSON equivalent (e.g. a non-finite float).
    #[error("unsupported YAML value: {0}")]
    Unsupported(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
