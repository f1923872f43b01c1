//! Capture pipeline integration tests
//!
//! File-mode capture against a `wiremock` vision endpoint: local
//! validation happens before any request, backend failures and timeouts
//! turn into the fallback analysis.

mod common;

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use sil_consult::api::ApiClient;
use sil_consult::capture::{
    fallback_analysis, CapturePipeline, CaptureStrategy, DeviceCapabilities, ImageFile,
};
use sil_consult::config::CaptureConfig;
use sil_consult::error::SilError;
use sil_consult::profile::{Analyzer, SkinIssue};

fn pipeline(client: ApiClient) -> CapturePipeline {
    CapturePipeline::new(
        Arc::new(client),
        Analyzer::ClaudeVision,
        CaptureConfig::default(),
        DeviceCapabilities::default(),
    )
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_oversized_file_rejected_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze-skin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::analysis_json()))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let big = dir.path().join("huge.jpg");
    std::fs::write(&big, vec![0u8; 11 * 1024 * 1024]).unwrap();

    let file = ImageFile::from_path(&big).await.unwrap();
    assert_eq!(file.mime, "image/jpeg");

    let pipeline = pipeline(ApiClient::with_base_url(server.uri()).unwrap());
    let err = pipeline.analyze_file(&file).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SilError>(),
        Some(SilError::Validation(msg)) if msg.contains("huge.jpg")
    ));
}

#[tokio::test]
async fn test_non_image_rejected_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze-skin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::analysis_json()))
        .expect(0)
        .mount(&server)
        .await;

    let file = ImageFile::new("notes.pdf", "application/pdf", b"%PDF-1.4".to_vec());
    let pipeline = pipeline(ApiClient::with_base_url(server.uri()).unwrap());
    let err = pipeline.analyze_file(&file).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SilError>(),
        Some(SilError::Validation(_))
    ));
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_png_file_is_sent_as_jpeg() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze-skin"))
        .and(|req: &Request| {
            use base64::Engine;
            let body: serde_json::Value = match serde_json::from_slice(&req.body) {
                Ok(v) => v,
                Err(_) => return false,
            };
            body["image"]
                .as_str()
                .and_then(|b64| base64::engine::general_purpose::STANDARD.decode(b64).ok())
                .is_some_and(|bytes| bytes.starts_with(&[0xff, 0xd8]))
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(common::analysis_json()))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, png) = common::temp_png("face.png");
    let file = ImageFile::from_path(&png).await.unwrap();
    assert_eq!(file.mime, "image/png");

    let pipeline = pipeline(ApiClient::with_base_url(server.uri()).unwrap());
    assert_eq!(pipeline.strategy(), CaptureStrategy::NativePicker);

    let outcome = pipeline.analyze_file(&file).await.unwrap();
    assert!(!outcome.is_fallback());
    assert!(outcome.analysis.has_issue(SkinIssue::Acne));
}

#[tokio::test]
async fn test_backend_error_yields_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze-skin"))
        .respond_with(ResponseTemplate::new(500).set_body_string("vision model offline"))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, png) = common::temp_png("face.png");
    let file = ImageFile::from_path(&png).await.unwrap();
    let pipeline = pipeline(ApiClient::with_base_url(server.uri()).unwrap());

    let outcome = pipeline.analyze_file(&file).await.unwrap();
    assert!(outcome.is_fallback());
    assert_eq!(outcome.analysis, fallback_analysis());
}

#[tokio::test]
async fn test_slow_backend_times_out_into_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze-skin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::analysis_json())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(server.uri())
        .unwrap()
        .with_analyze_timeout(Duration::from_millis(200));
    let (_dir, png) = common::temp_png("face.png");
    let file = ImageFile::from_path(&png).await.unwrap();

    let outcome = pipeline(client).analyze_file(&file).await.unwrap();
    assert!(outcome.is_fallback());
    assert_eq!(
        outcome.analysis.issues,
        vec![SkinIssue::Dryness, SkinIssue::DarkCircle, SkinIssue::UnevenTone]
    );
}
