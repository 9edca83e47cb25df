use std::io::Read;

use common::storage::{Locator, Representation};
use flate2::read::GzDecoder;

use crate::common::{TestApp, pdf_bytes, png_bytes};

fn gunzip(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .expect("body should be valid gzip");
    out
}

#[tokio::test]
async fn anonymous_public_file_with_and_without_gzip() {
    let app = TestApp::spawn().await;
    let png = png_bytes();
    app.create_file("alice", "logo.png", &png, "public").await;

    let gz = app.fetch_content("logo.png", None, Some("gzip")).await;
    assert_eq!(gz.status, 200);
    assert_eq!(gz.header("content-encoding"), Some("gzip"));
    assert_eq!(gz.header("content-type"), Some("image/png"));
    assert_eq!(gz.header("vary"), Some("Accept-Encoding"));
    assert_eq!(gunzip(&gz.bytes), png);

    let plain = app.fetch_content("logo.png", None, None).await;
    assert_eq!(plain.status, 200);
    assert_eq!(plain.header("content-encoding"), None);
    assert_eq!(plain.header("content-type"), Some("image/png"));
    assert_eq!(plain.header("content-length"), Some(png.len().to_string().as_str()));
    assert_eq!(plain.bytes, png);
}

#[tokio::test]
async fn disposition_is_inline_with_name() {
    let app = TestApp::spawn().await;
    app.create_file("alice", "logo.png", &png_bytes(), "public")
        .await;

    let res = app.fetch_content("logo.png", None, None).await;
    let disposition = res.header("content-disposition").unwrap();
    assert!(disposition.starts_with("inline;"));
    assert!(disposition.contains("filename=\"logo.png\""));
}

#[tokio::test]
async fn zero_quality_gzip_gets_plain_bytes() {
    let app = TestApp::spawn().await;
    app.create_file("alice", "a.txt", b"hello", "public").await;

    let res = app.fetch_content("a.txt", None, Some("gzip;q=0")).await;
    assert_eq!(res.header("content-encoding"), None);
    assert_eq!(res.bytes, b"hello");
}

#[tokio::test]
async fn anonymous_cannot_read_internal_or_private() {
    let app = TestApp::spawn().await;
    app.create_file("alice", "team.txt", b"team", "internal").await;
    app.create_file("alice", "report.pdf", &pdf_bytes(), "private")
        .await;

    assert_eq!(app.fetch_content("team.txt", None, None).await.status, 404);
    assert_eq!(app.fetch_content("report.pdf", None, None).await.status, 404);
}

#[tokio::test]
async fn identified_callers_follow_visibility() {
    let app = TestApp::spawn().await;
    let pdf = pdf_bytes();
    app.create_file("alice", "team.txt", b"team", "internal").await;
    app.create_file("alice", "report.pdf", &pdf, "private").await;

    assert_eq!(app.fetch_content("team.txt", Some("bob"), None).await.status, 200);

    let bob = app.fetch_content("report.pdf", Some("bob"), None).await;
    let absent = app.fetch_content("absent.pdf", Some("bob"), None).await;
    assert_eq!(bob.status, 404);
    assert_eq!(bob.bytes, absent.bytes);

    let alice = app.fetch_content("report.pdf", Some("alice"), None).await;
    assert_eq!(alice.status, 200);
    assert_eq!(alice.header("content-type"), Some("application/pdf"));
    assert_eq!(alice.bytes, pdf);

    let root = app.fetch_content("report.pdf", Some("root"), Some("gzip")).await;
    assert_eq!(root.status, 200);
    assert_eq!(gunzip(&root.bytes), pdf);
}

#[tokio::test]
async fn missing_mirror_is_a_server_error() {
    let app = TestApp::spawn().await;
    let record = app.create_file("alice", "a.txt", b"hello", "public").await;

    let locator = Locator::parse(record["locator"].as_str().unwrap()).unwrap();
    let mirror = app.backend.content_path(&locator, Representation::Compressed);
    std::fs::remove_file(mirror).unwrap();

    let res = app.fetch_content("a.txt", None, Some("gzip")).await;
    assert_eq!(res.status, 500);
    assert_eq!(res.header("content-encoding"), None);

    let plain = app.fetch_content("a.txt", None, None).await;
    assert_eq!(plain.status, 200);
    assert_eq!(plain.bytes, b"hello");
}

#[tokio::test]
async fn both_representations_exist_after_upload() {
    let app = TestApp::spawn().await;
    let record = app.create_file("alice", "a.txt", b"hello", "public").await;
    let locator = Locator::parse(record["locator"].as_str().unwrap()).unwrap();

    assert!(app.backend.content_path(&locator, Representation::Plain).exists());
    assert!(
        app.backend
            .content_path(&locator, Representation::Compressed)
            .exists()
    );
}
