//! Replicate image-to-video adapter (asynchronous)
//!
//! Submits a prediction and returns immediately; the reconciler waits for the terminal state.

use serde_json::json;

use super::client::{PreferWait, ReplicateClient};
use super::types::Prediction;
use crate::error::MediaError;
use crate::registry::ModelDescriptor;
use crate::types::{ErrorDetail, GenerationJob, GenerationRequest, JobStatus, MediaReference};

/// Provider input for an image-to-video request.
pub fn video_input(request: &GenerationRequest) -> serde_json::Value {
    let mut input = json!({
        "start_image": request.source_image.as_str(),
        "prompt": request.prompt,
    });
    if let Some(duration) = request.duration {
        input["duration"] = json!(duration.seconds());
    }
    input
}

/// Submit the job. The returned job may already be terminal when the backend rejects it on
/// creation.
pub async fn submit_image_to_video(
    client: &ReplicateClient,
    model: &ModelDescriptor,
    request: &GenerationRequest,
) -> Result<GenerationJob, MediaError> {
    let prediction = client
        .create_prediction(model, video_input(request), PreferWait::No)
        .await?;
    let mut job = prediction_job(&prediction);
    job.failed_on_creation = job.status == JobStatus::Failed;

    match job.status {
        JobStatus::Failed => tracing::error!(
            prediction_id = %prediction.id,
            error = ?prediction.error,
            "prediction failed immediately on creation"
        ),
        _ if prediction.has_error() => tracing::warn!(
            prediction_id = %prediction.id,
            error = ?prediction.error,
            "non-fatal error during prediction creation"
        ),
        _ => tracing::debug!(
            prediction_id = %prediction.id,
            status = prediction.status.as_str(),
            "prediction created"
        ),
    }

    Ok(job)
}

/// Snapshot a prediction as a job whose output is a remote URL.
pub fn prediction_job(prediction: &Prediction) -> GenerationJob {
    GenerationJob {
        id: Some(prediction.id.clone()),
        status: prediction.status.job_status(),
        provider_status: Some(prediction.status.as_str().to_string()),
        output: prediction
            .output_strings()
            .first()
            .map(|url| MediaReference::Remote((*url).to_string())),
        error_detail: prediction.error.clone().and_then(ErrorDetail::from_value),
        warnings: Vec::new(),
        logs: prediction.logs.clone().filter(|logs| !logs.is_empty()),
        poll_url: prediction.poll_url().map(str::to_string),
        failed_on_creation: false,
    }
}
