use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::compress::Compressor;
use super::error::StorageError;
use super::locator::Locator;
use super::traits::{BoxReader, ContentStore, Representation, StoredContent};

/// Filesystem-backed content store.
///
/// Layout under `base_path`:
/// - `{locator}`: plaintext as uploaded
/// - `{locator}.gz`: compressed mirror
/// - `.tmp/`: staging area for in-flight writes
///
/// Writes land in `.tmp` first and are renamed into place once both
/// representations are complete, so readers never observe a plaintext file
/// without its mirror.
pub struct FilesystemContentStore {
    base_path: PathBuf,
    max_size: u64,
    compressor: Arc<dyn Compressor>,
}

impl FilesystemContentStore {
    /// Create a new filesystem content store, creating the directory tree if needed.
    pub async fn new(
        base_path: PathBuf,
        max_size: u64,
        compressor: Arc<dyn Compressor>,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
            compressor,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, locator: &Locator, representation: Representation) -> PathBuf {
        match representation {
            Representation::Plain => self.base_path.join(locator.as_str()),
            Representation::Compressed => self.base_path.join(locator.mirror_name()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Compress `src` into `dest` on the blocking pool, one buffer at a time.
    async fn compress_file(&self, src: PathBuf, dest: PathBuf) -> Result<(), StorageError> {
        let compressor = Arc::clone(&self.compressor);
        tokio::task::spawn_blocking(move || {
            let mut input = std::io::BufReader::new(std::fs::File::open(&src)?);
            let file = std::fs::File::create(&dest)?;
            let mut output = std::io::BufWriter::new(&file);
            compressor.compress(&mut input, &mut output)?;
            output.flush()?;
            drop(output);
            file.sync_all()?;
            Ok::<(), StorageError>(())
        })
        .await
        .map_err(|e| StorageError::Compression(format!("compression task failed: {e}")))?
    }

    /// Copy `reader` into `dest`, enforcing the size limit.
    async fn copy_limited(&self, mut reader: BoxReader, dest: &Path) -> Result<u64, StorageError> {
        let mut file = fs::File::create(dest).await?;
        let mut buf = vec![0u8; 64 * 1024];
        let mut total: u64 = 0;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            total += n as u64;
            if total > self.max_size {
                return Err(StorageError::SizeLimitExceeded {
                    actual: total,
                    limit: self.max_size,
                });
            }
            file.write_all(&buf[..n]).await?;
        }

        file.flush().await?;
        file.sync_all().await?;
        Ok(total)
    }
}

/// Removes staged files when dropped, unless disarmed.
///
/// Covers both error returns and the request future being dropped mid-write.
struct StagingGuard {
    paths: Vec<PathBuf>,
}

impl StagingGuard {
    fn new() -> Self {
        Self { paths: Vec::new() }
    }

    fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    fn disarm(mut self) {
        self.paths.clear();
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        for path in &self.paths {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed staged file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(path = %path.display(), "Failed to remove staged file: {e}"),
            }
        }
    }
}

#[async_trait]
impl ContentStore for FilesystemContentStore {
    async fn store(&self, locator: &Locator, reader: BoxReader) -> Result<u64, StorageError> {
        let mut staged = StagingGuard::new();

        let temp_plain = self.temp_path();
        staged.track(temp_plain.clone());
        let size = self.copy_limited(reader, &temp_plain).await?;

        let temp_mirror = self.temp_path();
        staged.track(temp_mirror.clone());
        self.compress_file(temp_plain.clone(), temp_mirror.clone())
            .await?;

        let final_plain = self.path_for(locator, Representation::Plain);
        let final_mirror = self.path_for(locator, Representation::Compressed);

        // Mirror first: a plaintext file on disk always has its mirror.
        fs::rename(&temp_mirror, &final_mirror).await?;
        staged.track(final_mirror);
        fs::rename(&temp_plain, &final_plain).await?;

        staged.disarm();
        Ok(size)
    }

    async fn open(
        &self,
        locator: &Locator,
        representation: Representation,
    ) -> Result<StoredContent, StorageError> {
        let path = self.path_for(locator, representation);
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(display_name(
                    locator,
                    representation,
                )));
            }
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata().await?.len();
        Ok(StoredContent {
            reader: Box::new(BufReader::new(file)),
            len,
        })
    }

    async fn rebuild_mirror(&self, locator: &Locator) -> Result<(), StorageError> {
        let plain = self.path_for(locator, Representation::Plain);
        if !fs::try_exists(&plain).await? {
            return Err(StorageError::NotFound(locator.to_string()));
        }

        let mut staged = StagingGuard::new();
        let temp_mirror = self.temp_path();
        staged.track(temp_mirror.clone());
        self.compress_file(plain, temp_mirror.clone()).await?;
        fs::rename(&temp_mirror, self.path_for(locator, Representation::Compressed)).await?;
        staged.disarm();
        Ok(())
    }

    async fn remove(&self, locator: &Locator) -> Result<(), StorageError> {
        // Plaintext first: a mirror without plaintext is never served.
        for representation in [Representation::Plain, Representation::Compressed] {
            match fs::remove_file(self.path_for(locator, representation)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn encoding(&self) -> &'static str {
        self.compressor.encoding()
    }
}

fn display_name(locator: &Locator, representation: Representation) -> String {
    match representation {
        Representation::Plain => locator.to_string(),
        Representation::Compressed => locator.mirror_name(),
    }
}
