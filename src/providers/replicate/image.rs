//! Replicate image-to-image adapter (synchronous)
//!
//! One `Prefer: wait` call; generated files are downloaded and returned inline.

use base64::Engine;
use serde_json::json;

use super::client::{PreferWait, ReplicateClient};
use super::types::Prediction;
use crate::error::MediaError;
use crate::registry::ModelDescriptor;
use crate::types::{ErrorDetail, GenerationJob, GenerationRequest, JobStatus, MediaReference};

/// MIME type reported for generated images.
pub const GENERATED_IMAGE_MIME: &str = "image/png";

/// Provider input for an image-to-image request.
pub fn image_input(request: &GenerationRequest) -> serde_json::Value {
    let mut input = json!({
        "prompt": request.prompt,
        "num_outputs": 1,
        "image_prompt": request.source_image.as_str(),
    });
    if let Some(seed) = request.seed {
        input["seed"] = json!(seed);
    }
    input
}

/// Run the prediction and finalize the job.
///
/// A successful prediction that still carries an `error` value yields a warning; warnings void
/// the result during normalization.
pub async fn image_to_image(
    client: &ReplicateClient,
    model: &ModelDescriptor,
    request: &GenerationRequest,
) -> Result<GenerationJob, MediaError> {
    let prediction = client
        .create_prediction(model, image_input(request), PreferWait::Yes)
        .await?;

    match prediction.status.job_status() {
        JobStatus::Created | JobStatus::Running => Err(MediaError::ProviderContractError(format!(
            "Image generation did not finish within the synchronous wait (status: {})",
            prediction.status.as_str()
        ))),
        JobStatus::Failed => Ok(GenerationJob {
            id: Some(prediction.id.clone()),
            provider_status: Some(prediction.status.as_str().to_string()),
            logs: prediction.logs.clone().filter(|logs| !logs.is_empty()),
            ..GenerationJob::failed(prediction.error.clone().and_then(ErrorDetail::from_value))
        }),
        JobStatus::Succeeded => finalize_success(client, &prediction).await,
    }
}

async fn finalize_success(
    client: &ReplicateClient,
    prediction: &Prediction,
) -> Result<GenerationJob, MediaError> {
    let mut job = GenerationJob::succeeded(None).with_id(prediction.id.clone());
    job.provider_status = Some(prediction.status.as_str().to_string());

    if prediction.has_error() {
        let detail = prediction
            .error
            .clone()
            .and_then(ErrorDetail::from_value)
            .map(|d| d.describe())
            .unwrap_or_default();
        job = job.with_warning(detail);
    }

    let outputs = prediction.output_strings();
    if outputs.len() > 1 {
        tracing::debug!(
            prediction_id = %prediction.id,
            count = outputs.len(),
            "using the first of several generated images"
        );
    }
    if let Some(first) = outputs.first() {
        let payload = inline_payload(client, first).await?;
        job.output = Some(MediaReference::inline_base64(GENERATED_IMAGE_MIME, &payload));
    }

    Ok(job)
}

/// Base64 payload for one output, downloading it unless it is already a data URI.
async fn inline_payload(client: &ReplicateClient, output: &str) -> Result<String, MediaError> {
    if let Some(rest) = output.strip_prefix("data:") {
        return Ok(rest
            .split_once(',')
            .map(|(_, payload)| payload.to_string())
            .unwrap_or_default());
    }
    let bytes = client.download(output).await?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}
