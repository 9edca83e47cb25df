use anyhow::Context;
use common::storage::Locator;
use sea_orm::ConnectionTrait;
use tracing::{error, info, instrument, warn};

use super::delivery::ContentDelivery;
use super::metadata::FileStore;
use crate::config::OnError;

/// Summary of a recompress pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecompressReport {
    pub processed: usize,
    /// Names of files that could not be processed. Always empty under
    /// [`OnError::Abort`], which returns the first failure instead.
    pub failed: Vec<String>,
}

/// Re-detect the MIME type of every stored file, persist it and rebuild its
/// compressed mirror.
#[instrument(skip(db, delivery))]
pub async fn recompress_all<C: ConnectionTrait>(
    db: &C,
    delivery: &ContentDelivery,
    on_error: OnError,
) -> anyhow::Result<RecompressReport> {
    let store = FileStore::new(db);
    let records = store
        .all_locators()
        .await
        .context("Failed to list stored files")?;

    info!(count = records.len(), "Starting recompress pass");
    let mut report = RecompressReport::default();

    for (name, locator) in records {
        match recompress_one(&store, delivery, &locator).await {
            Ok(mime) => {
                report.processed += 1;
                tracing::debug!(%name, %locator, %mime, "Recompressed");
            }
            Err(e) if on_error == OnError::Continue => {
                warn!(%name, %locator, "Recompress failed: {e:#}");
                report.failed.push(name);
            }
            Err(e) => {
                error!(%name, %locator, "Recompress failed, aborting: {e:#}");
                return Err(e.context(format!("Failed to recompress '{name}'")));
            }
        }
    }

    info!(
        processed = report.processed,
        failed = report.failed.len(),
        "Recompress pass finished"
    );
    Ok(report)
}

async fn recompress_one<C: ConnectionTrait>(
    store: &FileStore<'_, C>,
    delivery: &ContentDelivery,
    locator: &str,
) -> anyhow::Result<String> {
    let locator = Locator::parse(locator).context("Stored locator is invalid")?;
    let mime = delivery.detect_mime(&locator).await?;
    store.set_mime(&locator, &mime).await?;
    delivery.rebuild_mirror(&locator).await?;
    Ok(mime)
}
