//! Upstream fetch error types.

use thiserror::Error;

/// Errors talking to the external archive source.
///
/// Every variant is terminal for a materialization run; the absence of a
/// manifest afterwards is the signal that a future read may retry.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("file resolution failed for {archive_ref}: {reason}")]
    Resolve { archive_ref: String, reason: String },

    #[error("archive download failed: {0}")]
    Download(String),

    #[error("archive too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for upstream operations.
pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;
