//! Fetch error types.

use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type surfaced by the fetch gateway.
///
/// Internal transient conditions (403, 429, 5xx, redirect-resolution issues,
/// bypass-strategy failures) are absorbed inside the retry controller and
/// never individually surfaced; callers only ever see [`FetchError::Exhausted`]
/// or a precondition/infrastructure failure.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The attempt budget was consumed without a terminal success.
    #[error("Fetch exhausted after {attempts} attempts (last status {last_status}): {url}")]
    Exhausted {
        /// HTTP status of the final attempt (0 if the transport never
        /// produced a response).
        last_status: u16,
        /// Number of attempts made.
        attempts: u32,
        /// The URL of the final attempt.
        url: String,
    },

    /// Core error (invalid URL, missing host).
    #[error("Core error: {0}")]
    Core(#[from] gatepass_core::CoreError),

    /// Credential store failure.
    #[error("Store error: {0}")]
    Store(#[from] gatepass_store::StoreError),

    /// HTTP client could not be constructed.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),
}

// ============================================================================
// HTTP Error
// ============================================================================

/// Transport-level error for a single HTTP attempt.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error from the underlying client.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A header name or value could not be encoded.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

// ============================================================================
// Bypass Error
// ============================================================================

/// Error raised by a bypass strategy.
///
/// The retry controller catches these, logs them, and treats them exactly as
/// "no remediation available"; they never propagate to the caller.
#[derive(Debug, Error)]
pub enum BypassError {
    /// The strategy ran but failed internally.
    #[error("Bypass strategy failed: {0}")]
    Failed(String),

    /// IO error while driving an external solver.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
