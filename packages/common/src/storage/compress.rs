use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::write::GzEncoder;

use super::error::StorageError;

/// Produces the compressed mirror of stored content.
///
/// Implementations are synchronous and CPU-bound; callers run them on the
/// blocking pool.
pub trait Compressor: Send + Sync {
    /// Value of the `Content-Encoding` header for the produced bytes.
    fn encoding(&self) -> &'static str;

    /// Stream `input` through the codec into `output`.
    fn compress(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<(), StorageError>;
}

/// In-process gzip codec.
#[derive(Debug, Clone, Copy)]
pub struct GzipCompressor {
    level: Compression,
}

impl GzipCompressor {
    /// `level` is clamped to the 0-9 range accepted by zlib.
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl Compressor for GzipCompressor {
    fn encoding(&self) -> &'static str {
        "gzip"
    }

    fn compress(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<(), StorageError> {
        let mut encoder = GzEncoder::new(output, self.level);
        io::copy(input, &mut encoder).map_err(|e| StorageError::Compression(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| StorageError::Compression(e.to_string()))?
            .flush()
            .map_err(|e| StorageError::Compression(e.to_string()))
    }
}
