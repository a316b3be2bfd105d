//! Image-to-video pipeline against a mock Replicate API.

mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use siumai_media::prelude::*;
use support::*;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VIDEO_URL: &str = "https://replicate.delivery/xezq/out.mp4";

async fn mount_create(server: &MockServer, response: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(format!("/models/{VIDEO_MODEL}/predictions")))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(201).set_body_json(response))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_poll(server: &MockServer, response: serde_json::Value, times: u64) {
    Mock::given(method("GET"))
        .and(path("/predictions/p1"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

fn with(mut value: serde_json::Value, key: &str, field: serde_json::Value) -> serde_json::Value {
    value[key] = field;
    value
}

#[tokio::test]
async fn polls_until_succeeded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/models/{VIDEO_MODEL}/predictions")))
        .and(body_partial_json(json!({
            "input": {
                "start_image": SOURCE_IMAGE,
                "prompt": "the cat starts dancing",
                "duration": 5,
            }
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(prediction(&server, "p1", "starting")),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_poll(&server, prediction(&server, "p1", "processing"), 2).await;
    mount_poll(
        &server,
        with(
            prediction(&server, "p1", "succeeded"),
            "output",
            json!(VIDEO_URL),
        ),
        1,
    )
    .await;

    let outcome = pipeline(&server).image_to_video(&video_body(json!(5))).await;

    assert_eq!(
        outcome.response_body(Capability::ImageToVideo),
        json!({"videoUrl": VIDEO_URL})
    );
    assert_eq!(request_count(&server).await, 4);
}

#[tokio::test]
async fn duration_outside_allowed_set_is_rejected() {
    let server = MockServer::start().await;

    let outcome = pipeline(&server).image_to_video(&video_body(json!(7))).await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::Validation));
    assert_eq!(outcome.status_code(), 400);
    assert!(
        outcome
            .message()
            .unwrap()
            .contains("Duration must be the number 5 or 10"),
        "{outcome:?}"
    );
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn other_provider_is_rejected() {
    let server = MockServer::start().await;
    let mut body = video_body(json!(10));
    body["provider"] = json!("fal");

    let outcome = pipeline(&server).image_to_video(&body).await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::Validation));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn backend_failure_is_provider_reported() {
    let server = MockServer::start().await;
    mount_create(&server, prediction(&server, "p1", "starting")).await;
    mount_poll(
        &server,
        with(
            prediction(&server, "p1", "failed"),
            "error",
            json!({"message": "NSFW content detected"}),
        ),
        1,
    )
    .await;

    let outcome = pipeline(&server).image_to_video(&video_body(json!(5))).await;

    assert_eq!(
        outcome,
        GenerationOutcome::Failure {
            error_kind: ErrorKind::ProviderReported,
            category: ResponseCategory::ServerError,
            message: "Video generation failed: NSFW content detected".into(),
        }
    );
}

#[tokio::test]
async fn failure_on_creation_skips_polling() {
    let server = MockServer::start().await;
    mount_create(
        &server,
        with(
            prediction(&server, "p1", "failed"),
            "error",
            json!("Invalid start_image"),
        ),
    )
    .await;

    let outcome = pipeline(&server).image_to_video(&video_body(json!(5))).await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::ProviderReported));
    assert_eq!(
        outcome.message(),
        Some("Prediction creation failed: Invalid start_image")
    );
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn failure_without_error_quotes_logs() {
    let server = MockServer::start().await;
    mount_create(&server, prediction(&server, "p1", "processing")).await;
    mount_poll(
        &server,
        with(
            prediction(&server, "p1", "canceled"),
            "logs",
            json!("step 1\nstep 2"),
        ),
        1,
    )
    .await;

    let outcome = pipeline(&server).image_to_video(&video_body(json!(10))).await;

    assert_eq!(
        outcome.message(),
        Some("Video generation canceled. Check logs: step 1\nstep 2")
    );
}

#[tokio::test]
async fn succeeded_without_url_is_contract_error() {
    let server = MockServer::start().await;
    mount_create(&server, prediction(&server, "p1", "starting")).await;
    mount_poll(
        &server,
        with(prediction(&server, "p1", "succeeded"), "output", json!(null)),
        1,
    )
    .await;

    let outcome = pipeline(&server).image_to_video(&video_body(json!(5))).await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::ProviderContract));
    assert_eq!(
        outcome.message(),
        Some("Video generation succeeded, but no valid video URL was found in the output.")
    );
}

#[tokio::test]
async fn missing_credential_makes_no_calls() {
    let server = MockServer::start().await;
    let pipeline = MediaPipeline::builder()
        .credentials(StaticCredentials::new())
        .base_url(server.uri())
        .build()
        .unwrap();

    let outcome = pipeline.image_to_video(&video_body(json!(5))).await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::Configuration));
    assert_eq!(outcome.status_code(), 500);
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn status_codes_map_to_categories() {
    let cases = [
        (401, ErrorKind::Unauthorized, 401, "Authentication error: Invalid Replicate API Token."),
        (
            422,
            ErrorKind::Validation,
            400,
            "Invalid input for the Replicate model: duration: must be 5 or 10",
        ),
        (503, ErrorKind::Transport, 500, "Provider API error (503): duration: must be 5 or 10"),
    ];
    for (status, kind, http_status, message) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/models/{VIDEO_MODEL}/predictions")))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "detail": "duration: must be 5 or 10",
                "status": status,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = pipeline(&server).image_to_video(&video_body(json!(5))).await;

        assert_eq!(outcome.error_kind(), Some(kind), "{status}");
        assert_eq!(outcome.status_code(), http_status, "{status}");
        assert_eq!(outcome.message(), Some(message), "{status}");
    }
}

#[tokio::test]
async fn unknown_version_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predictions"))
        .and(body_partial_json(json!({"version": "deadbeef"})))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "title": "Not found",
            "detail": "The requested version does not exist",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pinned = format!("{VIDEO_MODEL}:deadbeef");
    let registry = ModelRegistry::builtin().with_model(ModelDescriptor::new(
        Capability::ImageToVideo,
        "replicate",
        pinned.clone(),
        "Kling pinned",
    ));
    let pipeline = builder(&server).registry(registry).build().unwrap();
    let mut body = video_body(json!(5));
    body["modelId"] = json!(pinned);

    let outcome = pipeline.image_to_video(&body).await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::NotFound));
    assert_eq!(outcome.status_code(), 404);
}

#[tokio::test]
async fn stuck_job_times_out() {
    let server = MockServer::start().await;
    mount_create(&server, prediction(&server, "p1", "starting")).await;
    mount_poll(&server, prediction(&server, "p1", "processing"), 100).await;

    let pipeline = builder(&server)
        .poll_policy(fast_poll().with_max_attempts(3))
        .build()
        .unwrap();
    let outcome = pipeline.image_to_video(&video_body(json!(5))).await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::Transport));
    assert_eq!(outcome.status_code(), 504);
    assert!(
        outcome
            .message()
            .unwrap()
            .starts_with("Request timed out or was aborted"),
        "{outcome:?}"
    );
    // One submission, three polls.
    assert_eq!(request_count(&server).await, 4);
}

#[tokio::test]
async fn cancellation_stops_polling() {
    let server = MockServer::start().await;
    mount_create(&server, prediction(&server, "p1", "starting")).await;
    mount_poll(&server, prediction(&server, "p1", "processing"), 10_000).await;

    let pipeline = builder(&server)
        .poll_policy(
            fast_poll()
                .with_max_attempts(u32::MAX)
                .with_deadline(Duration::from_secs(60)),
        )
        .build()
        .unwrap();
    let cancel = CancelHandle::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let outcome = pipeline
        .generate_with_cancel(Capability::ImageToVideo, &video_body(json!(5)), &cancel)
        .await;

    assert_eq!(
        outcome.message(),
        Some("Request timed out or was aborted.")
    );
    assert_eq!(outcome.status_code(), 504);

    // Let any request that was already on the wire land first.
    tokio::time::sleep(Duration::from_millis(30)).await;
    let polls_at_cancel = request_count(&server).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(request_count(&server).await, polls_at_cancel);
}

#[tokio::test]
async fn stored_video_replaces_provider_url() {
    let server = MockServer::start().await;
    mount_create(
        &server,
        with(prediction(&server, "p1", "succeeded"), "output", json!(VIDEO_URL)),
    )
    .await;

    let uploader = Arc::new(RecordingUploader::storing_at(
        "https://cdn.example.com/image-to-videos/out.mp4",
    ));
    let pipeline = builder(&server).uploader(uploader.clone()).build().unwrap();

    let outcome = pipeline.image_to_video(&video_body(json!(5))).await;

    assert_eq!(
        outcome.media(),
        Some(&MediaReference::Remote(
            "https://cdn.example.com/image-to-videos/out.mp4".into()
        ))
    );
    let uploaded = uploader.uploaded.lock().unwrap();
    assert_eq!(uploaded.len(), 1);
    assert_eq!(
        uploaded[0].data,
        ArtifactData::Remote {
            url: VIDEO_URL.into()
        }
    );
    assert_eq!(uploaded[0].content_type, "video/mp4");
    assert!(uploaded[0]
        .key
        .starts_with(&format!("image-to-videos/replicate/{VIDEO_MODEL}/")));
    assert!(uploaded[0].key.ends_with("_the_cat_starts_danci.mp4"));
}

#[tokio::test]
async fn storage_failure_is_reported() {
    let server = MockServer::start().await;
    mount_create(
        &server,
        with(prediction(&server, "p1", "succeeded"), "output", json!(VIDEO_URL)),
    )
    .await;

    let pipeline = builder(&server)
        .uploader(RecordingUploader::failing())
        .build()
        .unwrap();

    let outcome = pipeline.image_to_video(&video_body(json!(5))).await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::Storage));
    assert_eq!(
        outcome.message(),
        Some("Video generation succeeded, but failed to store permanently.")
    );
    assert_eq!(outcome.status_code(), 500);
}
