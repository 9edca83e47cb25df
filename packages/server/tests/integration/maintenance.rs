use common::AccessLevel;
use common::storage::{Locator, Representation};
use sea_orm::EntityTrait;

use server::config::OnError;
use server::entity::file;
use server::files::{FileStore, NewFile, recompress_all};

use crate::common::{TestBackend, png_bytes};

async fn seed(backend: &TestBackend, name: &str, bytes: &[u8], mime: Option<&str>) -> Locator {
    let locator = Locator::generate();
    backend.seed_content(&locator, bytes).await;
    FileStore::new(&backend.db)
        .insert(NewFile {
            name: name.to_string(),
            locator: locator.clone(),
            owner: "alice".to_string(),
            access_level: AccessLevel::Public,
            mime: mime.map(str::to_string),
        })
        .await
        .unwrap();
    locator
}

#[tokio::test]
async fn recompress_backfills_mime_and_mirror() {
    let backend = TestBackend::new().await;
    let locator = seed(&backend, "logo.png", &png_bytes(), None).await;

    let mirror = backend.content_path(&locator, Representation::Compressed);
    std::fs::remove_file(&mirror).unwrap();

    let report = recompress_all(&backend.db, &backend.content, OnError::Abort)
        .await
        .unwrap();
    assert_eq!(report.processed, 1);
    assert!(report.failed.is_empty());

    let record = file::Entity::find_by_id("logo.png".to_string())
        .one(&backend.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.mime.as_deref(), Some("image/png"));
    assert!(
        backend
            .content_path(&locator, Representation::Compressed)
            .exists()
    );
}

#[tokio::test]
async fn abort_policy_stops_at_first_failure() {
    let backend = TestBackend::new().await;
    let broken = seed(&backend, "a-broken.txt", b"a", None).await;
    seed(&backend, "b-fine.txt", b"b", None).await;
    std::fs::remove_file(backend.content_path(&broken, Representation::Plain)).unwrap();

    let err = recompress_all(&backend.db, &backend.content, OnError::Abort)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("a-broken.txt"));

    let untouched = file::Entity::find_by_id("b-fine.txt".to_string())
        .one(&backend.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.mime, None);
}

#[tokio::test]
async fn continue_policy_reports_failures() {
    let backend = TestBackend::new().await;
    let broken = seed(&backend, "a-broken.txt", b"a", None).await;
    seed(&backend, "b-fine.txt", b"b", None).await;
    std::fs::remove_file(backend.content_path(&broken, Representation::Plain)).unwrap();

    let report = recompress_all(&backend.db, &backend.content, OnError::Continue)
        .await
        .unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, vec!["a-broken.txt".to_string()]);
}
