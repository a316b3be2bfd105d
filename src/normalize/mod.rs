//! Result normalizer
//!
//! Turns whatever the adapter and reconciler produced into a [`GenerationOutcome`]. The mapping
//! is a pure function of its input, so normalizing the same terminal job twice gives the same
//! outcome.

use crate::error::{ErrorKind, MediaError};
use crate::types::{Capability, GenerationJob, GenerationOutcome, JobStatus};

/// Logs longer than this are cut down to their tail in failure messages.
const LOG_TAIL_CHARS: usize = 500;

/// Normalize an adapter/reconciler result.
pub fn normalize(
    capability: Capability,
    result: &Result<GenerationJob, MediaError>,
) -> GenerationOutcome {
    match result {
        Ok(job) => normalize_job(capability, job),
        Err(error) => normalize_error(capability, error),
    }
}

/// Normalize a job snapshot. Non-terminal jobs are a contract violation at this point.
pub fn normalize_job(capability: Capability, job: &GenerationJob) -> GenerationOutcome {
    let noun = capability.media_noun();
    match job.status {
        JobStatus::Succeeded => {
            if let Some(warning) = job.warnings.first() {
                return GenerationOutcome::failure(
                    ErrorKind::ProviderContract,
                    format!("{noun} generation warnings: {warning}."),
                );
            }
            match &job.output {
                Some(media) if media.is_usable() => GenerationOutcome::success(media.clone()),
                _ => GenerationOutcome::failure(
                    ErrorKind::ProviderContract,
                    missing_output(capability),
                ),
            }
        }
        JobStatus::Failed => GenerationOutcome::failure(
            ErrorKind::ProviderReported,
            failure_message(capability, job),
        ),
        JobStatus::Created | JobStatus::Running => GenerationOutcome::failure(
            ErrorKind::ProviderContract,
            format!(
                "{noun} generation did not reach a terminal state (status: {}).",
                job.status_text()
            ),
        ),
    }
}

/// Normalize a pipeline error into a classified failure.
pub fn normalize_error(capability: Capability, error: &MediaError) -> GenerationOutcome {
    let kind = error.kind_for(capability);
    GenerationOutcome::Failure {
        error_kind: kind,
        category: error.category_for(capability),
        message: error_message(capability, error),
    }
}

fn missing_output(capability: Capability) -> &'static str {
    match capability {
        Capability::ImageToImage => "Image generation failed, no image returned.",
        Capability::ImageToVideo => {
            "Video generation succeeded, but no valid video URL was found in the output."
        }
    }
}

fn failure_message(capability: Capability, job: &GenerationJob) -> String {
    let stage = if job.failed_on_creation {
        "Prediction creation".to_string()
    } else {
        format!("{} generation", capability.media_noun())
    };
    let status = job.status_text();
    if let Some(detail) = &job.error_detail {
        return format!("{stage} {status}: {}", detail.describe());
    }
    let mut message = format!("{stage} {status}.");
    if let Some(logs) = job.logs.as_deref().filter(|l| !l.is_empty()) {
        message.push_str(" Check logs: ");
        message.push_str(log_tail(logs));
    }
    message
}

/// Last `LOG_TAIL_CHARS` characters, split on a char boundary.
fn log_tail(logs: &str) -> &str {
    let count = logs.chars().count();
    if count <= LOG_TAIL_CHARS {
        return logs;
    }
    let start = logs
        .char_indices()
        .nth(count - LOG_TAIL_CHARS)
        .map_or(0, |(idx, _)| idx);
    &logs[start..]
}

fn error_message(capability: Capability, error: &MediaError) -> String {
    let noun = capability.media_noun();
    match error {
        MediaError::ApiError { code, message, .. } => match (code, capability) {
            (401 | 403, Capability::ImageToImage) => {
                format!("Server configuration error: {message}")
            }
            (401 | 403, Capability::ImageToVideo) => {
                "Authentication error: Invalid Replicate API Token.".to_string()
            }
            (404, _) => format!(
                "Model version not found. Ensure 'modelId' includes the correct version hash \
                 (owner/name:version_hash). {message}"
            ),
            (422, _) => format!("Invalid input for the Replicate model: {message}"),
            _ => format!("Provider API error ({code}): {message}"),
        },
        MediaError::CancelledError(_) => "Request timed out or was aborted.".to_string(),
        MediaError::TimeoutError(detail) => format!("Request timed out or was aborted: {detail}"),
        MediaError::HttpError(detail) => format!("{noun} generation request failed: {detail}"),
        MediaError::ParseError(detail) | MediaError::JsonError(detail) => {
            format!("Malformed provider response: {detail}")
        }
        MediaError::StorageError(_) => {
            format!("{noun} generation succeeded, but failed to store permanently.")
        }
        MediaError::ConfigurationError(message) | MediaError::ProviderContractError(message) => {
            message.clone()
        }
        MediaError::ValidationError(_)
        | MediaError::UnsupportedModelError { .. }
        | MediaError::UnsupportedProviderError { .. }
        | MediaError::InvalidTransitionError { .. } => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FieldErrors, ResponseCategory};
    use crate::types::{ErrorDetail, MediaReference};

    fn failed_video(detail: Option<ErrorDetail>, logs: Option<&str>) -> GenerationJob {
        let mut job = GenerationJob::failed(detail).with_id("p1");
        job.provider_status = Some("failed".into());
        job.logs = logs.map(str::to_string);
        job
    }

    #[test]
    fn backend_failure_passes_message_through() {
        let detail =
            ErrorDetail::from_value(serde_json::json!({"message": "NSFW content detected"}));
        let outcome = normalize_job(Capability::ImageToVideo, &failed_video(detail, None));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::ProviderReported));
        assert_eq!(
            outcome.message(),
            Some("Video generation failed: NSFW content detected")
        );
        assert_eq!(outcome.status_code(), 500);
    }

    #[test]
    fn creation_failure_names_the_stage() {
        let detail = ErrorDetail::from_value(serde_json::json!("Invalid start_image"));
        let mut job = failed_video(detail, None);
        job.failed_on_creation = true;
        let outcome = normalize_job(Capability::ImageToVideo, &job);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::ProviderReported));
        assert_eq!(
            outcome.message(),
            Some("Prediction creation failed: Invalid start_image")
        );
    }

    #[test]
    fn failure_without_detail_quotes_log_tail() {
        let logs = format!("{}END", "x".repeat(600));
        let outcome = normalize_job(Capability::ImageToVideo, &failed_video(None, Some(&logs)));
        let message = outcome.message().unwrap();
        assert!(message.starts_with("Video generation failed. Check logs: "));
        assert!(message.ends_with("END"));
        assert_eq!(
            message.len(),
            "Video generation failed. Check logs: ".len() + LOG_TAIL_CHARS
        );

        let outcome = normalize_job(Capability::ImageToVideo, &failed_video(None, None));
        assert_eq!(outcome.message(), Some("Video generation failed."));
    }

    #[test]
    fn canceled_status_text_is_kept() {
        let mut job = failed_video(None, None);
        job.provider_status = Some("canceled".into());
        let outcome = normalize_job(Capability::ImageToVideo, &job);
        assert_eq!(outcome.message(), Some("Video generation canceled."));
    }

    #[test]
    fn warnings_void_the_result() {
        let job = GenerationJob::succeeded(Some(MediaReference::inline_base64("image/png", "QUJD")))
            .with_warning("seed ignored");
        let outcome = normalize_job(Capability::ImageToImage, &job);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::ProviderContract));
        assert_eq!(
            outcome.message(),
            Some("Image generation warnings: seed ignored.")
        );
    }

    #[test]
    fn success_without_usable_output() {
        let outcome = normalize_job(Capability::ImageToImage, &GenerationJob::succeeded(None));
        assert_eq!(
            outcome.message(),
            Some("Image generation failed, no image returned.")
        );

        let job = GenerationJob::succeeded(Some(MediaReference::Remote("not-a-url".into())));
        let outcome = normalize_job(Capability::ImageToVideo, &job);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::ProviderContract));
        assert_eq!(
            outcome.message(),
            Some("Video generation succeeded, but no valid video URL was found in the output.")
        );
    }

    #[test]
    fn success_returns_media() {
        let media = MediaReference::Remote("https://replicate.delivery/out.mp4".into());
        let outcome = normalize_job(
            Capability::ImageToVideo,
            &GenerationJob::succeeded(Some(media.clone())),
        );
        assert_eq!(outcome, GenerationOutcome::success(media));
    }

    #[test]
    fn normalization_is_idempotent() {
        let jobs = [
            GenerationJob::succeeded(Some(MediaReference::Remote("https://a/b.mp4".into()))),
            failed_video(None, Some("boom")),
            GenerationJob::succeeded(None).with_warning("w"),
        ];
        for job in jobs {
            let result = Ok(job);
            assert_eq!(
                normalize(Capability::ImageToVideo, &result),
                normalize(Capability::ImageToVideo, &result)
            );
        }
    }

    #[test]
    fn non_terminal_job_is_contract_error() {
        let outcome = normalize_job(
            Capability::ImageToVideo,
            &GenerationJob::new(JobStatus::Running),
        );
        assert_eq!(outcome.error_kind(), Some(ErrorKind::ProviderContract));
    }

    #[test]
    fn auth_errors_by_capability() {
        let err = MediaError::api_error(401, "Unauthenticated");
        let image = normalize_error(Capability::ImageToImage, &err);
        assert_eq!(image.error_kind(), Some(ErrorKind::Configuration));
        assert_eq!(image.message(), Some("Server configuration error: Unauthenticated"));
        assert_eq!(image.status_code(), 500);

        let video = normalize_error(Capability::ImageToVideo, &err);
        assert_eq!(video.error_kind(), Some(ErrorKind::Unauthorized));
        assert_eq!(
            video.message(),
            Some("Authentication error: Invalid Replicate API Token.")
        );
        assert_eq!(video.status_code(), 401);
    }

    #[test]
    fn status_specific_messages() {
        let video = Capability::ImageToVideo;
        let outcome = normalize_error(video, &MediaError::api_error(422, "duration invalid"));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Validation));
        assert_eq!(
            outcome.message(),
            Some("Invalid input for the Replicate model: duration invalid")
        );
        assert_eq!(outcome.status_code(), 400);

        let outcome = normalize_error(video, &MediaError::api_error(404, "version missing"));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::NotFound));
        assert!(outcome.message().unwrap().starts_with("Model version not found."));
        assert_eq!(outcome.status_code(), 404);

        let outcome = normalize_error(video, &MediaError::api_error(502, "bad gateway"));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Transport));
        assert_eq!(outcome.message(), Some("Provider API error (502): bad gateway"));
    }

    #[test]
    fn transport_timeouts() {
        let outcome = normalize_error(
            Capability::ImageToVideo,
            &MediaError::CancelledError("aborted".into()),
        );
        assert_eq!(
            outcome,
            GenerationOutcome::Failure {
                error_kind: ErrorKind::Transport,
                category: ResponseCategory::Timeout,
                message: "Request timed out or was aborted.".into(),
            }
        );
        assert_eq!(outcome.status_code(), 504);
    }

    #[test]
    fn local_errors_keep_their_text() {
        let err = MediaError::ValidationError(FieldErrors::single(
            "duration",
            "Duration must be the number 5 or 10",
        ));
        let outcome = normalize_error(Capability::ImageToVideo, &err);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Validation));
        assert_eq!(
            outcome.message(),
            Some("Invalid input: duration: Duration must be the number 5 or 10")
        );

        let err = MediaError::ConfigurationError(
            "Server configuration error: Missing Replicate API Token.".into(),
        );
        let outcome = normalize_error(Capability::ImageToImage, &err);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Configuration));
        assert_eq!(
            outcome.message(),
            Some("Server configuration error: Missing Replicate API Token.")
        );
    }

    #[test]
    fn storage_failure_message() {
        let outcome = normalize_error(
            Capability::ImageToVideo,
            &MediaError::StorageError("bucket down".into()),
        );
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Storage));
        assert_eq!(
            outcome.message(),
            Some("Video generation succeeded, but failed to store permanently.")
        );
    }
}
