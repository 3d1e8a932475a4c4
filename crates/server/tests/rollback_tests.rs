//! Integration tests for pipeline failure semantics: rollback completeness
//! and re-triggerability.

mod common;

use axum::http::StatusCode;
use common::fixtures::{
    chapter_zip, json_request, post_webhook, wait_for_flight_release, webhook_event,
};
use common::mocks::{FlakyStore, MockArchiveSource};
use common::TestServer;
use hondana_storage::ObjectStore;

#[tokio::test]
async fn failed_upload_rolls_back_every_written_key() {
    let source = MockArchiveSource::new();
    source.insert("file-abc", chapter_zip());
    // page2.jpg fails mid fan-out; page1/page10 succeed first or after.
    let server = TestServer::with_wrapped_storage(source, |inner| {
        FlakyStore::wrapping(inner, "page2")
    })
    .await;

    post_webhook(&server.router, webhook_event(42, "Chapter_7.zip", "file-abc")).await;

    let (status, _) = json_request(
        &server.router,
        "GET",
        "/v1/series/serie-42/chapters/7",
        None,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    wait_for_flight_release(&server.state, "serie-42", "7").await;

    // Rollback completeness: zero objects under the chapter prefix.
    let leftover = server.storage().list("serie-42/7/").await.unwrap();
    assert!(leftover.is_empty(), "orphaned objects: {leftover:?}");
    assert!(!server
        .storage()
        .exists("serie-42/7/manifest.json")
        .await
        .unwrap());

    // The absent manifest makes the next read re-trigger, not serve a
    // stale failure.
    let (status, body) = json_request(
        &server.router,
        "GET",
        "/v1/series/serie-42/chapters/7",
        None,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "processing");
}

#[tokio::test]
async fn failed_download_aborts_before_any_upload() {
    let source = MockArchiveSource::new();
    source.fail_download("file-abc");
    let server = TestServer::with_source(source.clone()).await;

    post_webhook(&server.router, webhook_event(42, "Chapter_7.zip", "file-abc")).await;

    let (status, _) = json_request(
        &server.router,
        "GET",
        "/v1/series/serie-42/chapters/7",
        None,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    wait_for_flight_release(&server.state, "serie-42", "7").await;

    assert_eq!(source.fetch_count(), 1);
    assert!(server.storage().list("serie-42/7/").await.unwrap().is_empty());

    // A later read re-triggers materialization.
    let (status, _) = json_request(
        &server.router,
        "GET",
        "/v1/series/serie-42/chapters/7",
        None,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    wait_for_flight_release(&server.state, "serie-42", "7").await;
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn archive_without_images_writes_nothing() {
    let source = MockArchiveSource::new();
    source.insert(
        "file-abc",
        common::fixtures::build_zip(&[("notes.txt", b"no pages here".as_slice())]),
    );
    let server = TestServer::with_source(source).await;

    post_webhook(&server.router, webhook_event(42, "Chapter_7.zip", "file-abc")).await;
    json_request(
        &server.router,
        "GET",
        "/v1/series/serie-42/chapters/7",
        None,
        &[],
    )
    .await;
    wait_for_flight_release(&server.state, "serie-42", "7").await;

    assert!(server.storage().list("serie-42/7/").await.unwrap().is_empty());
}

#[tokio::test]
async fn recovery_after_transient_failure_completes_normally() {
    // First run fails on page2; removing the failure lets a re-read
    // materialize the chapter from scratch.
    let source = MockArchiveSource::new();
    source.insert("file-abc", chapter_zip());
    let flaky_server = TestServer::with_wrapped_storage(source.clone(), |inner| {
        FlakyStore::wrapping(inner, "page2")
    })
    .await;

    post_webhook(
        &flaky_server.router,
        webhook_event(42, "Chapter_7.zip", "file-abc"),
    )
    .await;
    json_request(
        &flaky_server.router,
        "GET",
        "/v1/series/serie-42/chapters/7",
        None,
        &[],
    )
    .await;
    wait_for_flight_release(&flaky_server.state, "serie-42", "7").await;
    assert!(flaky_server
        .storage()
        .list("serie-42/7/")
        .await
        .unwrap()
        .is_empty());

    // Same archive on a healthy server: full materialization.
    let healthy_server = TestServer::with_source(source).await;
    post_webhook(
        &healthy_server.router,
        webhook_event(42, "Chapter_7.zip", "file-abc"),
    )
    .await;
    json_request(
        &healthy_server.router,
        "GET",
        "/v1/series/serie-42/chapters/7",
        None,
        &[],
    )
    .await;
    common::fixtures::wait_for_manifest(&healthy_server.state, "serie-42", "7").await;

    let keys = healthy_server
        .storage()
        .list("serie-42/7/")
        .await
        .unwrap();
    assert_eq!(keys.len(), 4); // three pages + manifest
}
