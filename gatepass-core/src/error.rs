//! Core error types for Gatepass.

use thiserror::Error;

/// Core error type for Gatepass operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The URL has no host component to derive a domain from.
    #[error("URL has no host: {0}")]
    MissingHost(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
