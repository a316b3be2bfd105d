//! Optional result persistence
//!
//! The pipeline always calls through [`MediaUploader`]; deployments without object storage use
//! [`NoopUploader`], which keeps the provider's transient reference.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::MediaError;
use crate::types::Capability;

/// Bytes to persist, either inline or at a provider URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactData {
    /// Base64 payload without the data URI header.
    Inline { base64: String },
    /// Remote file the uploader fetches itself.
    Remote { url: String },
}

/// One file handed to the uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub capability: Capability,
    pub provider: String,
    pub model_id: String,
    /// Object key, see [`object_key`].
    pub key: String,
    pub content_type: String,
    pub data: ArtifactData,
}

/// Object storage collaborator.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Persist `artifact`. `Ok(None)` means nothing was stored and the caller keeps its
    /// transient reference; `Ok(Some(url))` is the permanent location.
    async fn upload(&self, artifact: &Artifact) -> Result<Option<String>, MediaError>;
}

#[async_trait]
impl<T: MediaUploader + ?Sized> MediaUploader for Arc<T> {
    async fn upload(&self, artifact: &Artifact) -> Result<Option<String>, MediaError> {
        (**self).upload(artifact).await
    }
}

/// Uploader that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUploader;

#[async_trait]
impl MediaUploader for NoopUploader {
    async fn upload(&self, _artifact: &Artifact) -> Result<Option<String>, MediaError> {
        Ok(None)
    }
}

/// Unique per-request key stem: `<unix millis>-<short random id>`.
pub fn unique_stem() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{millis}-{}", &id[..9])
}

/// Object key for a generated (or source) file.
///
/// Image keys look like `image-to-images/<provider>/<model>/<stem>_<suffix>`, video keys like
/// `image-to-videos/<provider>/<owner>/<name>/<version>/<stem>_<prompt>.mp4` where the prompt is
/// cut to 20 characters with everything outside `[A-Za-z0-9]` replaced by `_`.
pub fn object_key(
    capability: Capability,
    provider: &str,
    model_id: &str,
    stem: &str,
    prompt: &str,
    suffix: &str,
) -> String {
    let prefix = capability.storage_prefix();
    match capability {
        Capability::ImageToImage => format!("{prefix}/{provider}/{model_id}/{stem}_{suffix}"),
        Capability::ImageToVideo => format!(
            "{prefix}/{provider}/{}/{stem}_{}.mp4",
            model_id.replacen(':', "/", 1),
            sanitize_prompt(prompt)
        ),
    }
}

fn sanitize_prompt(prompt: &str) -> String {
    prompt
        .chars()
        .take(20)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
