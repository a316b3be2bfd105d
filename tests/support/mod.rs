//! Shared helpers for the pipeline integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use siumai_media::prelude::*;
use wiremock::MockServer;

pub const TOKEN: &str = "r8_test_token";
pub const IMAGE_MODEL: &str = "black-forest-labs/flux-1.1-pro";
pub const VIDEO_MODEL: &str = "kwaivgi/kling-v1.6-standard";
pub const SOURCE_IMAGE: &str = "data:image/png;base64,AAA";

/// Poll policy small enough for tests.
pub fn fast_poll() -> PollPolicy {
    PollPolicy::new()
        .with_interval(Duration::from_millis(5))
        .with_max_attempts(20)
        .with_deadline(Duration::from_secs(5))
}

/// Pipeline pointed at the mock server with a fixed token.
pub fn builder(server: &MockServer) -> MediaPipelineBuilder {
    MediaPipeline::builder()
        .api_token(TOKEN)
        .base_url(server.uri())
        .poll_policy(fast_poll())
}

pub fn pipeline(server: &MockServer) -> MediaPipeline {
    builder(server).build().expect("pipeline")
}

pub fn image_body(model_id: &str) -> Value {
    json!({
        "image": SOURCE_IMAGE,
        "prompt": "a cat",
        "provider": "replicate",
        "modelId": model_id,
    })
}

pub fn video_body(duration: Value) -> Value {
    json!({
        "image": SOURCE_IMAGE,
        "prompt": "the cat starts dancing",
        "duration": duration,
        "provider": "replicate",
        "modelId": VIDEO_MODEL,
    })
}

/// Replicate prediction payload.
pub fn prediction(server: &MockServer, id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "status": status,
        "model": VIDEO_MODEL,
        "output": null,
        "error": null,
        "logs": "",
        "urls": {
            "get": format!("{}/predictions/{id}", server.uri()),
            "cancel": format!("{}/predictions/{id}/cancel", server.uri()),
        }
    })
}

pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or_default()
}

/// Uploader that records artifacts and answers with a fixed result.
pub struct RecordingUploader {
    pub uploaded: Mutex<Vec<Artifact>>,
    pub result: Result<Option<String>, MediaError>,
}

impl RecordingUploader {
    pub fn storing_at(url: &str) -> Self {
        Self {
            uploaded: Mutex::new(Vec::new()),
            result: Ok(Some(url.to_string())),
        }
    }

    pub fn failing() -> Self {
        Self {
            uploaded: Mutex::new(Vec::new()),
            result: Err(MediaError::StorageError("bucket unavailable".into())),
        }
    }
}

#[async_trait]
impl MediaUploader for RecordingUploader {
    async fn upload(&self, artifact: &Artifact) -> Result<Option<String>, MediaError> {
        self.uploaded.lock().unwrap().push(artifact.clone());
        self.result.clone()
    }
}
