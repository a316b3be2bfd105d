//! Validated generation requests

use serde::Serialize;

use super::capability::{Capability, VideoDuration};
use crate::utils::data_uri::DataUri;

/// A request that passed validation for its capability.
///
/// Only [`crate::validation::validate`] constructs these from raw input, so holders can rely on
/// the image being an `image/*` data URI and the prompt being non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub capability: Capability,
    #[serde(rename = "image")]
    pub source_image: DataUri,
    pub prompt: String,
    pub provider: String,
    pub model_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Present for image-to-video only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<VideoDuration>,
}

impl GenerationRequest {
    /// Registry lookup key.
    pub fn route_key(&self) -> (Capability, &str, &str) {
        (self.capability, &self.provider, &self.model_id)
    }
}
