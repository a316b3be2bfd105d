//! Built-in model catalog
//!
//! Replicate model identifiers wired for each capability. Ids are `owner/name`; pinned
//! versions use `owner/name:version_hash`.

use crate::types::Capability;

use super::ModelDescriptor;

/// Provider id for Replicate.
pub const REPLICATE: &str = "replicate";

/// Image-to-image models (Replicate, `image_prompt` input).
pub mod image_to_image {
    pub const FLUX_1_1_PRO: &str = "black-forest-labs/flux-1.1-pro";
    pub const FLUX_1_1_PRO_ULTRA: &str = "black-forest-labs/flux-1.1-pro-ultra";
}

/// Image-to-video models (Replicate, `start_image` input, 5 or 10 second clips).
pub mod image_to_video {
    pub const KLING_V1_6_STANDARD: &str = "kwaivgi/kling-v1.6-standard";
    pub const KLING_V1_6_PRO: &str = "kwaivgi/kling-v1.6-pro";
}

/// Descriptors loaded into the default registry.
pub fn builtin_models() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new(
            Capability::ImageToImage,
            REPLICATE,
            image_to_image::FLUX_1_1_PRO,
            "FLUX 1.1 Pro",
        ),
        ModelDescriptor::new(
            Capability::ImageToImage,
            REPLICATE,
            image_to_image::FLUX_1_1_PRO_ULTRA,
            "FLUX 1.1 Pro Ultra",
        ),
        ModelDescriptor::new(
            Capability::ImageToVideo,
            REPLICATE,
            image_to_video::KLING_V1_6_STANDARD,
            "Kling v1.6 Standard",
        ),
        ModelDescriptor::new(
            Capability::ImageToVideo,
            REPLICATE,
            image_to_video::KLING_V1_6_PRO,
            "Kling v1.6 Pro",
        ),
    ]
}
