//! Server adapters: turn a `GenerationOutcome` into an HTTP response
//!
//! The framework-agnostic part lives here: status code and JSON body, with optional masking of
//! server-side failure messages. Framework integrations sit in submodules.
//!
//! - **Axum integration**: `axum::router()` (requires `server-adapters` feature)

use crate::types::{Capability, GenerationOutcome, ResponseCategory};

#[cfg(feature = "server-adapters")]
pub mod axum;

/// Route paths, matching the public demo API.
pub const IMAGE_TO_IMAGE_PATH: &str = "/api/ai-demo/image-to-image";
pub const IMAGE_TO_VIDEO_PATH: &str = "/api/ai-demo/image-to-video";

/// Response rendering options.
#[derive(Debug, Clone, Default)]
pub struct ResponseOptions {
    /// Replace messages of 5xx failures with a generic one. Client errors (validation,
    /// unsupported model, auth, not found) are never masked.
    pub mask_errors: bool,

    /// Message used when masking. Defaults to "internal error".
    pub masked_error_message: Option<String>,
}

impl ResponseOptions {
    /// Full messages everywhere.
    pub fn development() -> Self {
        Self::default()
    }

    /// Masked server errors.
    pub fn production() -> Self {
        Self {
            mask_errors: true,
            masked_error_message: None,
        }
    }
}

/// Path served for a capability.
pub const fn route_path(capability: Capability) -> &'static str {
    match capability {
        Capability::ImageToImage => IMAGE_TO_IMAGE_PATH,
        Capability::ImageToVideo => IMAGE_TO_VIDEO_PATH,
    }
}

/// Status code and JSON body for an outcome.
pub fn http_response(
    capability: Capability,
    outcome: &GenerationOutcome,
    opts: &ResponseOptions,
) -> (u16, serde_json::Value) {
    let outcome = match outcome {
        GenerationOutcome::Failure {
            error_kind,
            category,
            ..
        } if opts.mask_errors && is_server_side(*category) => GenerationOutcome::Failure {
            error_kind: *error_kind,
            category: *category,
            message: opts
                .masked_error_message
                .clone()
                .unwrap_or_else(|| "internal error".to_string()),
        },
        other => other.clone(),
    };
    (outcome.status_code(), outcome.response_body(capability))
}

const fn is_server_side(category: ResponseCategory) -> bool {
    matches!(
        category,
        ResponseCategory::ServerError | ResponseCategory::Timeout
    )
}
