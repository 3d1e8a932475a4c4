//! Request helpers and archive fixtures.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use hondana_server::AppState;
use hondana_storage::ObjectStore;
use serde_json::{json, Value};
use std::io::Write;
use std::time::Duration;
use tower::ServiceExt;

/// Shared secret matching `AppConfig::for_testing()`.
pub const TEST_WEBHOOK_SECRET: &str = "test-webhook-secret";

/// Admin token matching `AdminConfig::for_testing()`.
pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

/// Build a zip archive in memory.
#[allow(dead_code)]
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, data) in entries {
        writer.start_file(*name, options).expect("start zip entry");
        writer.write_all(data).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// A three-page chapter archive with non-lexicographic page numbers.
#[allow(dead_code)]
pub fn chapter_zip() -> Vec<u8> {
    build_zip(&[
        ("page1.jpg", b"page-one".as_slice()),
        ("page2.jpg", b"page-two".as_slice()),
        ("page10.jpg", b"page-ten".as_slice()),
    ])
}

/// Webhook body announcing an archive.
#[allow(dead_code)]
pub fn webhook_event(topic_id: i64, file_name: &str, file_id: &str) -> Value {
    json!({
        "topicId": topic_id,
        "document": {
            "fileName": file_name,
            "fileId": file_id,
            "mimeType": "application/zip",
        }
    })
}

/// Make a request and decode the JSON response body.
#[allow(dead_code)]
pub async fn json_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let request = builder.body(body).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Post a webhook event with the test secret.
#[allow(dead_code)]
pub async fn post_webhook(router: &axum::Router, event: Value) -> (StatusCode, Value) {
    json_request(
        router,
        "POST",
        "/v1/ingest/webhook",
        Some(event),
        &[("X-Webhook-Secret", TEST_WEBHOOK_SECRET)],
    )
    .await
}

/// Make a request and collect the raw body as a string (for event streams).
#[allow(dead_code)]
pub async fn text_request(
    router: &axum::Router,
    uri: &str,
    headers: &[(&str, &str)],
) -> (StatusCode, String) {
    let mut builder = Request::builder().method("GET").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let response = router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8_lossy(&body_bytes).to_string())
}

/// Wait until the manifest for a chapter appears in the cache.
#[allow(dead_code)]
pub async fn wait_for_manifest(state: &AppState, slug: &str, number: &str) {
    let key = format!("{slug}/{number}/manifest.json");
    for _ in 0..500 {
        if state.storage.exists(&key).await.unwrap() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("manifest {key} did not appear in time");
}

/// Wait until the materialization claim for a chapter is released.
#[allow(dead_code)]
pub async fn wait_for_flight_release(state: &AppState, slug: &str, number: &str) {
    let claim = format!("{slug}/{number}/manifest.json");
    for _ in 0..500 {
        if !state.flights.is_in_flight(&claim).await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("materialization of {claim} did not finish in time");
}
