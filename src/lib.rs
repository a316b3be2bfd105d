//! # siumai-media - Image and video generation pipeline
//!
//! Runs image-to-image and image-to-video requests against hosted inference backends and
//! hands back one uniform [`GenerationOutcome`](types::GenerationOutcome), whatever the
//! backend or execution mode.
//!
#![deny(unsafe_code)]

//! ## Pipeline
//!
//! 1. **Validation**: raw JSON bodies become typed [`GenerationRequest`](types::GenerationRequest)s
//!    or field-level errors.
//! 2. **Registry**: the (capability, provider, model) triple must be registered.
//! 3. **Adapter**: one call to the backend. Image-to-image waits synchronously; image-to-video
//!    returns a pending job.
//! 4. **Reconciler**: pending jobs are polled with a fixed interval, an attempt cap and a
//!    deadline, and stop when the caller cancels.
//! 5. **Normalizer**: terminal jobs and errors map to a success or a classified failure.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use siumai_media::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = MediaPipeline::builder().build()?;
//!     let outcome = pipeline
//!         .image_to_video(&serde_json::json!({
//!             "image": "data:image/png;base64,iVBORw0KGgo=",
//!             "prompt": "the cat starts dancing",
//!             "duration": 5,
//!             "provider": "replicate",
//!             "modelId": "kwaivgi/kling-v1.6-standard",
//!         }))
//!         .await;
//!     println!("{}", outcome.response_body(Capability::ImageToVideo));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod providers;
pub mod reconcile;
pub mod registry;
pub mod server_adapters;
pub mod storage;
pub mod telemetry;
pub mod types;
pub mod utils;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use error::MediaError;
pub use pipeline::{MediaPipeline, MediaPipelineBuilder};

/// Commonly used types.
pub mod prelude {
    pub use crate::config::{CredentialSource, EnvCredentials, MediaConfig, StaticCredentials};
    pub use crate::error::{ErrorKind, FieldErrors, MediaError, ResponseCategory};
    pub use crate::pipeline::{MediaPipeline, MediaPipelineBuilder};
    pub use crate::reconcile::{JobReconciler, JobSource, PollPolicy};
    pub use crate::registry::{ModelDescriptor, ModelRegistry};
    pub use crate::storage::{Artifact, ArtifactData, MediaUploader, NoopUploader};
    pub use crate::types::{
        Capability, GenerationJob, GenerationOutcome, GenerationRequest, JobStatus,
        MediaReference, VideoDuration,
    };
    pub use crate::utils::cancel::CancelHandle;
}
