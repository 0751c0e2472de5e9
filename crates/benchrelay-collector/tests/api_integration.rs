//! API integration tests.
//!
//! Tests the complete request flow: HTTP → routes → progress/storage.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::Local;
use tower::ServiceExt;

use benchrelay_collector::config::Config;
use benchrelay_collector::progress::{ProgressKey, ProgressStore, RunState};
use benchrelay_collector::server::{Server, ServerBuilder};
use benchrelay_collector::store::ArtifactStore;

const TEST_SECRET: &str = "test-secret";

struct TestHarness {
    server: Server,
    progress: Arc<ProgressStore>,
    storage: tempfile::TempDir,
}

fn harness() -> Result<TestHarness> {
    let storage = tempfile::tempdir().context("create storage tempdir")?;
    let progress = Arc::new(ProgressStore::new());
    let server = ServerBuilder::new()
        .secret(TEST_SECRET)
        .storage_root(storage.path())
        .progress_store(Arc::clone(&progress))
        .build();
    Ok(TestHarness {
        server,
        progress,
        storage,
    })
}

#[tokio::test]
async fn test_status_report_updates_progress() -> Result<()> {
    let harness = harness()?;

    let status = helpers::post_form(
        harness.server.test_router(),
        "/status",
        &[
            ("password", TEST_SECRET),
            ("instance name", "worker-1"),
            ("benchmark project", "Intro"),
            ("message", "// ** Remained 10 2024-05-01 10:00"),
            ("is error", "false"),
            ("remaining benchmarks", "10"),
            ("total benchmark count", "42"),
            ("estimated finish", "2024-05-01 10:00"),
            ("current time", "2024-05-01 09:00"),
        ],
    )
    .await?;

    assert_eq!(status, StatusCode::OK);

    let snapshot = harness
        .progress
        .get(&ProgressKey::new("worker-1", "Intro"))
        .context("progress entry should exist")?;
    assert_eq!(snapshot.remaining, 10);
    assert_eq!(snapshot.total, 42);
    assert_eq!(snapshot.state, RunState::Running);
    assert_eq!(
        snapshot
            .estimated_finish
            .map(|eta| eta.format("%Y-%m-%d %H:%M").to_string()),
        Some("2024-05-01 10:00".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn test_status_with_wrong_credential_is_401_and_store_unchanged() -> Result<()> {
    let harness = harness()?;

    let status = helpers::post_form(
        harness.server.test_router(),
        "/status",
        &[
            ("password", "not-the-secret"),
            ("instance name", "worker-1"),
            ("benchmark project", "Intro"),
            ("message", "// ** Remained 10"),
            ("is error", "false"),
            ("remaining benchmarks", "10"),
            ("total benchmark count", "42"),
            ("estimated finish", ""),
            ("current time", "2024-05-01 09:00"),
        ],
    )
    .await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(harness.progress.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_status_with_wrong_content_type_is_400() -> Result<()> {
    let harness = harness()?;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/status")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"password":"test-secret"}"#))
        .context("build request")?;

    let response = harness
        .server
        .test_router()
        .oneshot(request)
        .await
        .map_err(|err| match err {})?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_status_with_unparsable_remaining_is_400() -> Result<()> {
    let harness = harness()?;

    let status = helpers::post_form(
        harness.server.test_router(),
        "/status",
        &[
            ("password", TEST_SECRET),
            ("instance name", "worker-1"),
            ("benchmark project", "Intro"),
            ("message", "// ** Remained ten"),
            ("is error", "false"),
            ("remaining benchmarks", "ten"),
            ("total benchmark count", "42"),
            ("estimated finish", ""),
            ("current time", "2024-05-01 09:00"),
        ],
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(harness.progress.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_status_with_invalid_estimated_finish_is_400() -> Result<()> {
    let harness = harness()?;

    let status = helpers::post_form(
        harness.server.test_router(),
        "/status",
        &[
            ("password", TEST_SECRET),
            ("instance name", "worker-1"),
            ("benchmark project", "Intro"),
            ("message", "// ** Remained 10 soon"),
            ("is error", "false"),
            ("remaining benchmarks", "10"),
            ("total benchmark count", "42"),
            ("estimated finish", "soon"),
            ("current time", "2024-05-01 09:00"),
        ],
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_status_with_empty_estimated_finish_is_accepted() -> Result<()> {
    let harness = harness()?;

    let status = helpers::post_form(
        harness.server.test_router(),
        "/status",
        &[
            ("password", TEST_SECRET),
            ("instance name", "worker-1"),
            ("benchmark project", "Intro"),
            ("message", "// ***** Found 42 benchmarks"),
            ("is error", "false"),
            ("remaining benchmarks", "42"),
            ("total benchmark count", "42"),
            ("estimated finish", ""),
            ("current time", "2024-05-01 09:00"),
        ],
    )
    .await?;

    assert_eq!(status, StatusCode::OK);

    let snapshot = harness
        .progress
        .get(&ProgressKey::new("worker-1", "Intro"))
        .context("progress entry should exist")?;
    assert_eq!(snapshot.estimated_finish, None);
    Ok(())
}

#[tokio::test]
async fn test_status_with_remaining_above_total_is_400() -> Result<()> {
    let harness = harness()?;

    let status = helpers::post_form(
        harness.server.test_router(),
        "/status",
        &[
            ("password", TEST_SECRET),
            ("instance name", "worker-1"),
            ("benchmark project", "Intro"),
            ("message", "// ** Remained 43"),
            ("is error", "false"),
            ("remaining benchmarks", "43"),
            ("total benchmark count", "42"),
            ("estimated finish", ""),
            ("current time", "2024-05-01 09:00"),
        ],
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(harness.progress.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_error_report_needs_no_numeric_fields() -> Result<()> {
    let harness = harness()?;

    let status = helpers::post_form(
        harness.server.test_router(),
        "/status",
        &[
            ("password", TEST_SECRET),
            ("instance name", "worker-1"),
            ("benchmark project", "Intro"),
            ("message", "Unhandled exception"),
            ("is error", "true"),
        ],
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    // Failure reports are logged, not stored.
    assert!(harness.progress.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_result_upload_is_persisted_under_date_partition() -> Result<()> {
    let harness = harness()?;

    let status = helpers::post_result(
        harness.server.test_router(),
        TEST_SECRET,
        "worker-1",
        "Intro",
        "results.zip",
        b"zip bytes",
    )
    .await?;

    assert_eq!(status, StatusCode::OK);

    let store = ArtifactStore::new(harness.storage.path());
    let day_dir = store.bundle_dir("worker-1", "Intro", Local::now().date_naive());
    assert_eq!(
        std::fs::read(day_dir.join("results.zip")).context("read stored bundle")?,
        b"zip bytes"
    );
    Ok(())
}

#[tokio::test]
async fn test_colliding_upload_is_renumbered() -> Result<()> {
    let harness = harness()?;

    for payload in [b"first".as_slice(), b"second".as_slice()] {
        let status = helpers::post_result(
            harness.server.test_router(),
            TEST_SECRET,
            "worker-1",
            "Intro",
            "results.zip",
            payload,
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
    }

    let store = ArtifactStore::new(harness.storage.path());
    let day_dir = store.bundle_dir("worker-1", "Intro", Local::now().date_naive());
    assert_eq!(
        std::fs::read(day_dir.join("results.zip")).context("read first bundle")?,
        b"first"
    );
    assert_eq!(
        std::fs::read(day_dir.join("results 1.zip")).context("read second bundle")?,
        b"second"
    );
    Ok(())
}

#[tokio::test]
async fn test_result_with_missing_file_is_400() -> Result<()> {
    let harness = harness()?;

    let body = helpers::multipart_body(
        helpers::BOUNDARY,
        &[
            ("password", TEST_SECRET),
            ("instance name", "worker-1"),
            ("benchmark project", "Intro"),
        ],
        None,
    );
    let status = helpers::post_multipart(harness.server.test_router(), body).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_result_with_wrong_credential_is_401() -> Result<()> {
    let harness = harness()?;

    let status = helpers::post_result(
        harness.server.test_router(),
        "not-the-secret",
        "worker-1",
        "Intro",
        "results.zip",
        b"zip bytes",
    )
    .await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let store = ArtifactStore::new(harness.storage.path());
    let day_dir = store.bundle_dir("worker-1", "Intro", Local::now().date_naive());
    assert!(!day_dir.join("results.zip").exists());
    Ok(())
}

#[tokio::test]
async fn test_result_with_wrong_content_type_is_400() -> Result<()> {
    let harness = harness()?;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/result")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .context("build request")?;

    let response = harness
        .server
        .test_router()
        .oneshot(request)
        .await
        .map_err(|err| match err {})?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_result_with_traversal_instance_name_is_400() -> Result<()> {
    let harness = harness()?;

    let status = helpers::post_result(
        harness.server.test_router(),
        TEST_SECRET,
        "../escape",
        "Intro",
        "results.zip",
        b"zip bytes",
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_result_upload_marks_progress_uploaded() -> Result<()> {
    let harness = harness()?;

    let status = helpers::post_form(
        harness.server.test_router(),
        "/status",
        &[
            ("password", TEST_SECRET),
            ("instance name", "worker-1"),
            ("benchmark project", "Intro"),
            ("message", "// ** Remained 0"),
            ("is error", "false"),
            ("remaining benchmarks", "0"),
            ("total benchmark count", "42"),
            ("estimated finish", ""),
            ("current time", "2024-05-01 09:00"),
        ],
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let status = helpers::post_result(
        harness.server.test_router(),
        TEST_SECRET,
        "worker-1",
        "Intro",
        "results.zip",
        b"zip bytes",
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let snapshot = harness
        .progress
        .get(&ProgressKey::new("worker-1", "Intro"))
        .context("progress entry should exist")?;
    assert_eq!(snapshot.state, RunState::Uploaded);
    Ok(())
}

#[tokio::test]
async fn test_default_config_rejects_configured_secret_mismatch() -> Result<()> {
    // A server built without an explicit secret still gates with the
    // built-in default; a worker presenting something else is rejected.
    let storage = tempfile::tempdir().context("create storage tempdir")?;
    let server = ServerBuilder::new().storage_root(storage.path()).build();
    assert!(server.config().uses_default_secret());
    assert_eq!(Config::default().effective_secret(), "password12345");

    let status = helpers::post_form(
        server.test_router(),
        "/status",
        &[
            ("password", "wrong"),
            ("instance name", "worker-1"),
            ("benchmark project", "Intro"),
            ("message", "x"),
            ("is error", "true"),
        ],
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_unauthorized_error_body_is_json() -> Result<()> {
    let harness = harness()?;

    let body = serde_urlencoded::to_string([("password", "wrong"), ("is error", "true")])
        .context("encode form body")?;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/status")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .context("build request")?;

    let response = harness
        .server
        .test_router()
        .oneshot(request)
        .await
        .map_err(|err| match err {})?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bytes = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .context("read response body")?;
    let json: serde_json::Value = serde_json::from_slice(&bytes).context("parse JSON body")?;
    assert_eq!(
        json.get("code").and_then(serde_json::Value::as_str),
        Some("UNAUTHORIZED")
    );
    Ok(())
}

mod helpers {
    use super::*;

    pub const BOUNDARY: &str = "benchrelay-test-boundary";

    pub async fn post_form(
        router: axum::Router,
        uri: &str,
        pairs: &[(&str, &str)],
    ) -> Result<StatusCode> {
        let body = serde_urlencoded::to_string(pairs).context("encode form body")?;
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(Body::from(body))
            .context("build request")?;

        let response = router.oneshot(request).await.map_err(|err| match err {})?;
        Ok(response.status())
    }

    pub fn multipart_body(
        boundary: &str,
        text_fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
    ) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in text_fields {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((name, file_name, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                     filename=\"{file_name}\"\r\nContent-Type: application/zip\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        body
    }

    pub async fn post_multipart(router: axum::Router, body: Vec<u8>) -> Result<StatusCode> {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/result")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .context("build request")?;

        let response = router.oneshot(request).await.map_err(|err| match err {})?;
        Ok(response.status())
    }

    pub async fn post_result(
        router: axum::Router,
        secret: &str,
        instance: &str,
        project: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StatusCode> {
        let body = multipart_body(
            BOUNDARY,
            &[
                ("password", secret),
                ("instance name", instance),
                ("benchmark project", project),
            ],
            Some(("BenchmarkResults", file_name, bytes)),
        );
        post_multipart(router, body).await
    }
}
