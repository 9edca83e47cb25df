use thiserror::Error;

use super::locator::LocatorError;

/// Errors that can occur while storing or serving file content.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested representation does not exist on disk.
    #[error("content not found: {0}")]
    NotFound(String),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    InvalidLocator(#[from] LocatorError),

    /// The upload exceeds the configured size limit.
    #[error("content exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },

    /// Producing the compressed mirror failed.
    #[error("compression failed: {0}")]
    Compression(String),
}
