use std::sync::Arc;

use common::storage::{BoxReader, ContentStore, Locator, Representation, StorageError, StoredContent};
use tracing::{debug, instrument};

/// Content bytes ready to be written to a response.
pub struct ServedContent {
    pub content: StoredContent,
    /// `Content-Encoding` to send, `None` for the plaintext.
    pub encoding: Option<&'static str>,
}

/// Outcome of storing an upload.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub size: u64,
    pub mime: String,
}

/// Moves bytes between uploads, the content store and responses.
#[derive(Clone)]
pub struct ContentDelivery {
    store: Arc<dyn ContentStore>,
}

impl ContentDelivery {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Persist an upload and its compressed mirror, then sniff its type.
    ///
    /// When this returns `Ok`, both representations are durable and the
    /// record may be committed.
    #[instrument(skip(self, reader), fields(%locator))]
    pub async fn store(
        &self,
        locator: &Locator,
        reader: BoxReader,
    ) -> Result<StoredFile, StorageError> {
        let size = self.store.store(locator, reader).await?;
        let mime = self.detect_mime(locator).await?;
        debug!(size, %mime, "stored content and mirror");
        Ok(StoredFile { size, mime })
    }

    pub async fn detect_mime(&self, locator: &Locator) -> Result<String, StorageError> {
        self.store.detect_mime(locator).await
    }

    /// Open the representation the caller asked for.
    ///
    /// A missing mirror is an error even when the plaintext exists: every
    /// stored file is expected to have one.
    pub async fn serve(
        &self,
        locator: &Locator,
        accepts_gzip: bool,
    ) -> Result<ServedContent, StorageError> {
        if accepts_gzip {
            let content = self.store.open(locator, Representation::Compressed).await?;
            Ok(ServedContent {
                content,
                encoding: Some(self.store.encoding()),
            })
        } else {
            let content = self.store.open(locator, Representation::Plain).await?;
            Ok(ServedContent {
                content,
                encoding: None,
            })
        }
    }

    /// Delete stored content that never got a record.
    pub async fn discard(&self, locator: &Locator) -> Result<(), StorageError> {
        self.store.remove(locator).await
    }

    pub async fn rebuild_mirror(&self, locator: &Locator) -> Result<(), StorageError> {
        self.store.rebuild_mirror(locator).await
    }
}
