//! HTTP-level tests for the remediation client against a mock server.

use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use redact_models::{
    BlurEffect, CensorMode, ClipBounds, JobHandle, NormalizedRegion, ReplacementMap, SegmentEntry,
};

use crate::client::{HttpRemediationClient, ServiceConfig};
use crate::error::ServiceError;
use crate::service::{
    BlurRequest, CensorRequest, ImageGuidedRequest, ReferenceImage, RemediationService,
    SegmentRequest,
};

// =============================================================================
// Test Helpers
// =============================================================================

fn client_for(server: &MockServer) -> HttpRemediationClient {
    let config = ServiceConfig::new(&server.uri()).unwrap();
    HttpRemediationClient::new(config).unwrap()
}

async fn last_json_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    let last = requests.last().expect("no request received");
    serde_json::from_slice(&last.body).unwrap()
}

fn job() -> JobHandle {
    JobHandle::from_string("job-123")
}

// =============================================================================
// Success paths
// =============================================================================

#[tokio::test]
async fn test_classify_region_parses_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/classify-region"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "itemName": "bottle",
            "reasoning": "Visible brand label",
            "suggestedActions": [
                {"id": "s1", "kind": "blur", "label": "Blur bottle", "description": "Hide the label"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .classify_region(&job(), 12.5, NormalizedRegion::new(10.0, 20.0, 30.0, 15.0))
        .await
        .unwrap();

    assert_eq!(result.item_name, "bottle");
    assert_eq!(result.suggested_actions[0].kind, "blur");

    let body = last_json_body(&server).await;
    assert_eq!(body["jobId"], "job-123");
    assert_eq!(body["timestamp"], 12.5);
    assert_eq!(body["box"]["top"], 10.0);
}

#[tokio::test]
async fn test_detect_and_blur_sends_effect_and_clip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/blur"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"downloadPath": "/outputs/job-123.mp4"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let artifact = client
        .detect_and_blur(
            &job(),
            BlurRequest {
                label: "license plate".into(),
                strength: 30,
                effect: BlurEffect::Pixelate,
                clip: Some(ClipBounds::new(1.0, 4.0)),
            },
        )
        .await
        .unwrap();

    assert_eq!(artifact.download_path, "/outputs/job-123.mp4");
    let body = last_json_body(&server).await;
    assert_eq!(body["targetObject"], "license plate");
    assert_eq!(body["effect"], "pixelate");
    assert_eq!(body["blurStrength"], 30);
    assert_eq!(body["startTime"], 1.0);
    assert_eq!(body["endTime"], 4.0);
}

#[tokio::test]
async fn test_censor_dub_sends_only_non_empty_replacements() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/profanity/censor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"downloadPath": "/o.mp4", "mode": "dub"})))
        .expect(1)
        .mount(&server)
        .await;

    let entries = vec![
        SegmentEntry::new("damn", 1.0, 1.3).with_replacement("darn"),
        SegmentEntry::new("hell", 2.0, 2.2),
    ];
    let client = client_for(&server);
    let outcome = client
        .censor(
            &job(),
            CensorRequest {
                mode: CensorMode::Dub,
                replacements: Some(ReplacementMap::from_entries(&entries)),
                matches: entries.clone(),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.mode, CensorMode::Dub);
    let body = last_json_body(&server).await;
    assert_eq!(body["mode"], "dub");
    assert_eq!(body["customWords"], json!({"damn": "darn"}));
    assert_eq!(body["matches"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_scan_audio_returns_matches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/profanity/scan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matches": [
                {"word": "damn", "start": 1.0, "end": 1.4, "confidence": 0.9},
                {"word": "hell", "startTime": 5.0, "endTime": 5.3, "speakerId": "spk_1"}
            ]
        })))
        .mount(&server)
        .await;

    let matches = client_for(&server).scan_audio(&job()).await.unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[1].speaker_id.as_deref(), Some("spk_1"));
    assert_ne!(matches[0].id, matches[1].id);
}

#[tokio::test]
async fn test_image_guided_replace_uploads_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/replace"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"downloadPath": "/r.mp4"})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .replace_image_guided(
            &job(),
            ImageGuidedRequest {
                prompt: "a red apple".into(),
                reference_image: ReferenceImage::from_file_name("apple.png", vec![137, 80, 78, 71]),
            },
        )
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"referenceImage\""));
    assert!(body.contains("a red apple"));
    assert!(body.contains("filename=\"apple.png\""));
}

#[tokio::test]
async fn test_bearer_token_is_sent_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/profanity/suggest"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"suggestions": ["darn", "dang"]})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ServiceConfig::new(&server.uri()).unwrap().with_api_key("tok-1");
    let client = HttpRemediationClient::new(config).unwrap();
    let suggestions = client.suggest_replacement(&job(), "damn").await.unwrap();
    assert_eq!(suggestions, vec!["darn", "dang"]);
}

// =============================================================================
// Error paths
// =============================================================================

#[tokio::test]
async fn test_remote_detail_message_is_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/segment"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "SAM2 worker crashed"})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .segment(
            &job(),
            SegmentRequest {
                label: "cup".into(),
                mask_only: true,
                color: "#000000".into(),
                opacity: 1.0,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Remote { status: 500, .. }));
    assert_eq!(err.message(), "SAM2 worker crashed");
}

#[tokio::test]
async fn test_not_found_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/profanity/scan"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Job not found"))
        .mount(&server)
        .await;

    let err = client_for(&server).scan_audio(&job()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(ref m) if m == "Job not found"));
}

#[tokio::test]
async fn test_unparseable_success_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/detect-objects"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .detect_object_names(&job(), 1.0, NormalizedRegion::new(0.0, 0.0, 10.0, 10.0))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_empty_suggestions_body_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/detect-objects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let names = client_for(&server)
        .detect_object_names(&job(), 1.0, NormalizedRegion::new(0.0, 0.0, 10.0, 10.0))
        .await
        .unwrap();
    assert!(names.is_empty());
}
