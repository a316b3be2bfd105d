//! Provider adapters
//!
//! Dispatch is a closed table over capability x provider. Each [`Route`] maps to exactly one
//! adapter function, so adding a backend means adding a variant and the compiler points at
//! every match that needs it.

pub mod replicate;

use crate::error::MediaError;
use crate::registry::ModelDescriptor;
use crate::registry::catalog::REPLICATE;
use crate::types::{Capability, GenerationJob, GenerationRequest};

use replicate::ReplicateClient;

/// What an adapter hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterOutput {
    /// Terminal job; no reconciliation needed.
    Ready(GenerationJob),
    /// Job accepted by the backend and still in flight.
    Pending(GenerationJob),
}

impl AdapterOutput {
    pub fn job(&self) -> &GenerationJob {
        match self {
            Self::Ready(job) | Self::Pending(job) => job,
        }
    }

    pub fn into_job(self) -> GenerationJob {
        match self {
            Self::Ready(job) | Self::Pending(job) => job,
        }
    }
}

/// A wired (capability, provider) combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    ReplicateImageToImage,
    ReplicateImageToVideo,
}

impl Route {
    pub const ALL: [Route; 2] = [Route::ReplicateImageToImage, Route::ReplicateImageToVideo];

    /// Route for a capability and provider id, if one is wired.
    pub fn resolve(capability: Capability, provider: &str) -> Option<Route> {
        match (capability, provider) {
            (Capability::ImageToImage, REPLICATE) => Some(Self::ReplicateImageToImage),
            (Capability::ImageToVideo, REPLICATE) => Some(Self::ReplicateImageToVideo),
            _ => None,
        }
    }

    pub const fn capability(self) -> Capability {
        match self {
            Self::ReplicateImageToImage => Capability::ImageToImage,
            Self::ReplicateImageToVideo => Capability::ImageToVideo,
        }
    }

    pub const fn provider(self) -> &'static str {
        match self {
            Self::ReplicateImageToImage | Self::ReplicateImageToVideo => REPLICATE,
        }
    }

    /// Invoke the adapter. Performs exactly one submission call (plus, for inline image
    /// results, the download of the generated file).
    pub async fn invoke(
        self,
        client: &ReplicateClient,
        model: &ModelDescriptor,
        request: &GenerationRequest,
    ) -> Result<AdapterOutput, MediaError> {
        match self {
            Self::ReplicateImageToImage => {
                replicate::image::image_to_image(client, model, request)
                    .await
                    .map(AdapterOutput::Ready)
            }
            Self::ReplicateImageToVideo => {
                let job = replicate::video::submit_image_to_video(client, model, request).await?;
                // A job that failed on creation skips reconciliation.
                Ok(if job.is_terminal() {
                    AdapterOutput::Ready(job)
                } else {
                    AdapterOutput::Pending(job)
                })
            }
        }
    }
}
