use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::locator::Locator;
use super::sniff::{SNIFF_LEN, detect_mime};

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Which on-disk copy of a file to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// The bytes exactly as uploaded.
    Plain,
    /// The compressed mirror produced at upload time.
    Compressed,
}

/// An open handle on one representation of a stored file.
pub struct StoredContent {
    pub reader: BoxReader,
    /// Size in bytes of this representation.
    pub len: u64,
}

/// Locator-addressed content storage that keeps a compressed mirror of every
/// file it holds.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Write `reader` verbatim at `locator`, then produce the compressed
    /// mirror. Returns the plaintext size.
    ///
    /// Both representations are in place when this returns `Ok`. On error
    /// neither is left behind.
    async fn store(&self, locator: &Locator, reader: BoxReader) -> Result<u64, StorageError>;

    /// Open one representation for streaming.
    async fn open(
        &self,
        locator: &Locator,
        representation: Representation,
    ) -> Result<StoredContent, StorageError>;

    /// Classify the stored plaintext by content sniffing.
    async fn detect_mime(&self, locator: &Locator) -> Result<String, StorageError> {
        let content = self.open(locator, Representation::Plain).await?;
        let mut head = Vec::with_capacity(SNIFF_LEN);
        content
            .reader
            .take(SNIFF_LEN as u64)
            .read_to_end(&mut head)
            .await?;
        Ok(detect_mime(&head))
    }

    /// Regenerate the compressed mirror from the stored plaintext.
    async fn rebuild_mirror(&self, locator: &Locator) -> Result<(), StorageError>;

    /// Delete both representations. Missing files are not an error.
    async fn remove(&self, locator: &Locator) -> Result<(), StorageError>;

    /// `Content-Encoding` of the compressed representation.
    fn encoding(&self) -> &'static str;
}
