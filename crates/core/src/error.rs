//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid chapter number: {0}")]
    InvalidChapterNumber(String),

    #[error("invalid cache key: {0}")]
    InvalidKey(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("archive entry too large: {entry} ({size} bytes, max {max})")]
    EntryTooLarge { entry: String, size: u64, max: u64 },

    #[error("archive contains no image entries")]
    NoImageEntries,

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
