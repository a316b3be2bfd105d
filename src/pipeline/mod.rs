//! Generation pipeline
//!
//! `MediaPipeline` runs one request end to end:
//! validate → registry lookup → route → credential → adapter → (async) reconcile → normalize →
//! persist. Everything before the adapter is local, so rejected requests never reach the
//! backend. Every path ends in a [`GenerationOutcome`]; errors never escape unclassified.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tracing::Instrument;

use crate::config::{CredentialSource, EnvCredentials, MediaConfig, StaticCredentials};
use crate::error::MediaError;
use crate::normalize;
use crate::providers::replicate::ReplicateClient;
use crate::providers::replicate::image::GENERATED_IMAGE_MIME;
use crate::providers::{AdapterOutput, Route};
use crate::reconcile::{JobReconciler, PollPolicy};
use crate::registry::catalog::REPLICATE;
use crate::registry::{ModelDescriptor, ModelRegistry};
use crate::storage::{Artifact, ArtifactData, MediaUploader, NoopUploader, object_key, unique_stem};
use crate::types::{Capability, GenerationOutcome, GenerationRequest, MediaReference};
use crate::utils::cancel::CancelHandle;
use crate::utils::data_uri::DataUri;
use crate::validation;

/// Message returned when no backend token is configured.
pub const MISSING_TOKEN_MESSAGE: &str = "Server configuration error: Missing Replicate API Token.";

/// Entry point for generation requests.
#[derive(Clone)]
pub struct MediaPipeline {
    config: MediaConfig,
    http: reqwest::Client,
    registry: Arc<ModelRegistry>,
    credentials: Arc<dyn CredentialSource>,
    uploader: Arc<dyn MediaUploader>,
    reconciler: JobReconciler,
}

impl std::fmt::Debug for MediaPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPipeline")
            .field("config", &self.config)
            .field("models", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl MediaPipeline {
    pub fn builder() -> MediaPipelineBuilder {
        MediaPipelineBuilder::new()
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Run an image-to-image request body.
    pub async fn image_to_image(&self, raw: &serde_json::Value) -> GenerationOutcome {
        self.generate(Capability::ImageToImage, raw).await
    }

    /// Run an image-to-video request body.
    pub async fn image_to_video(&self, raw: &serde_json::Value) -> GenerationOutcome {
        self.generate(Capability::ImageToVideo, raw).await
    }

    /// Run a raw request body for `capability`.
    pub async fn generate(
        &self,
        capability: Capability,
        raw: &serde_json::Value,
    ) -> GenerationOutcome {
        self.generate_with_cancel(capability, raw, &CancelHandle::new())
            .await
    }

    /// Run a raw request body, stopping as soon as `cancel` fires.
    pub async fn generate_with_cancel(
        &self,
        capability: Capability,
        raw: &serde_json::Value,
        cancel: &CancelHandle,
    ) -> GenerationOutcome {
        let span = tracing::info_span!("generate", capability = %capability);
        let result = cancel
            .run(self.execute(capability, raw, cancel))
            .instrument(span)
            .await;
        match result {
            Ok(outcome) => outcome,
            Err(error) => {
                if !error.is_local() {
                    tracing::error!(capability = %capability, error = %error, "generation failed");
                }
                normalize::normalize_error(capability, &error)
            }
        }
    }

    async fn execute(
        &self,
        capability: Capability,
        raw: &serde_json::Value,
        cancel: &CancelHandle,
    ) -> Result<GenerationOutcome, MediaError> {
        let request = validation::validate(capability, raw)?;
        let (model, route) = self.resolve(&request)?;
        let client = self.client_for(route.provider())?;

        let job = match route.invoke(&client, model, &request).await? {
            AdapterOutput::Ready(job) => job,
            AdapterOutput::Pending(job) => {
                tracing::debug!(job_id = ?job.id, "waiting for job");
                self.reconciler.wait(&client, job, cancel).await?
            }
        };

        let outcome = normalize::normalize_job(capability, &job);
        if let GenerationOutcome::Failure {
            error_kind,
            message,
            ..
        } = &outcome
        {
            tracing::error!(
                job_id = ?job.id,
                kind = %error_kind,
                %message,
                "generation job did not succeed"
            );
            return Ok(outcome);
        }
        self.persist(&request, outcome).await
    }

    /// Registry entry and adapter route for a validated request.
    fn resolve(
        &self,
        request: &GenerationRequest,
    ) -> Result<(&ModelDescriptor, Route), MediaError> {
        let (capability, provider, model_id) = request.route_key();
        let model = self
            .registry
            .resolve(capability, provider, model_id)
            .ok_or_else(|| MediaError::UnsupportedModelError {
                provider: provider.to_string(),
                model_id: model_id.to_string(),
            })?;
        let route = Route::resolve(capability, &model.provider).ok_or_else(|| {
            MediaError::UnsupportedProviderError {
                capability,
                provider: model.provider.clone(),
            }
        })?;
        Ok((model, route))
    }

    fn client_for(&self, provider: &str) -> Result<ReplicateClient, MediaError> {
        let token = self
            .credentials
            .api_token(provider)
            .ok_or_else(|| MediaError::ConfigurationError(MISSING_TOKEN_MESSAGE.to_string()))?;
        Ok(ReplicateClient::new(
            self.http.clone(),
            self.config.base_url.clone(),
            token,
        ))
    }

    async fn persist(
        &self,
        request: &GenerationRequest,
        outcome: GenerationOutcome,
    ) -> Result<GenerationOutcome, MediaError> {
        let Some(media) = outcome.media() else {
            return Ok(outcome);
        };
        match request.capability {
            Capability::ImageToImage => {
                self.persist_images(request, media).await;
                Ok(outcome)
            }
            Capability::ImageToVideo => self.persist_video(request, media).await,
        }
    }

    /// Upload the source and generated images side by side. Failures are logged only.
    async fn persist_images(&self, request: &GenerationRequest, generated: &MediaReference) {
        let stem = unique_stem();
        let source = &request.source_image;
        let original = self.artifact(
            request,
            &stem,
            &format!("original.{}", source.extension()),
            source.mime_type(),
            ArtifactData::Inline {
                base64: source.payload().to_string(),
            },
        );
        let generated_payload = DataUri::parse(generated.as_str())
            .map(|uri| uri.payload().to_string())
            .unwrap_or_default();
        let generated = self.artifact(
            request,
            &stem,
            "generated.png",
            GENERATED_IMAGE_MIME,
            ArtifactData::Inline {
                base64: generated_payload,
            },
        );

        let (original_result, generated_result) = futures::join!(
            self.uploader.upload(&original),
            self.uploader.upload(&generated)
        );
        for (artifact, result) in [(&original, original_result), (&generated, generated_result)] {
            match result {
                Ok(Some(url)) => tracing::info!(key = %artifact.key, %url, "stored image"),
                Ok(None) => {}
                Err(error) => {
                    tracing::error!(key = %artifact.key, error = %error, "failed to store image")
                }
            }
        }
    }

    /// Upload the generated video; a stored copy replaces the provider URL.
    async fn persist_video(
        &self,
        request: &GenerationRequest,
        media: &MediaReference,
    ) -> Result<GenerationOutcome, MediaError> {
        let artifact = self.artifact(
            request,
            &unique_stem(),
            "",
            "video/mp4",
            ArtifactData::Remote {
                url: media.as_str().to_string(),
            },
        );
        match self.uploader.upload(&artifact).await {
            Ok(Some(url)) => {
                tracing::info!(key = %artifact.key, %url, "stored video");
                Ok(GenerationOutcome::success(MediaReference::Remote(url)))
            }
            Ok(None) => Ok(GenerationOutcome::success(media.clone())),
            Err(error) => {
                tracing::error!(key = %artifact.key, error = %error, "failed to store video");
                Err(match error {
                    MediaError::StorageError(_) => error,
                    other => MediaError::StorageError(other.to_string()),
                })
            }
        }
    }

    fn artifact(
        &self,
        request: &GenerationRequest,
        stem: &str,
        suffix: &str,
        content_type: &str,
        data: ArtifactData,
    ) -> Artifact {
        Artifact {
            capability: request.capability,
            provider: request.provider.clone(),
            model_id: request.model_id.clone(),
            key: object_key(
                request.capability,
                &request.provider,
                &request.model_id,
                stem,
                &request.prompt,
                suffix,
            ),
            content_type: content_type.to_string(),
            data,
        }
    }
}

/// Builder for [`MediaPipeline`].
#[derive(Default)]
pub struct MediaPipelineBuilder {
    config: MediaConfig,
    api_token: Option<SecretString>,
    credentials: Option<Arc<dyn CredentialSource>>,
    registry: Option<ModelRegistry>,
    uploader: Option<Arc<dyn MediaUploader>>,
    http_client: Option<reqwest::Client>,
}

impl MediaPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed Replicate token instead of reading the environment.
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(SecretString::from(token.into()));
        self
    }

    /// Custom credential source. Ignored when `api_token` is set.
    pub fn credentials(mut self, credentials: impl CredentialSource + 'static) -> Self {
        self.credentials = Some(Arc::new(credentials));
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    pub fn poll_policy(mut self, policy: PollPolicy) -> Self {
        self.config.poll = policy;
        self
    }

    pub fn config(mut self, config: MediaConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn uploader(mut self, uploader: impl MediaUploader + 'static) -> Self {
        self.uploader = Some(Arc::new(uploader));
        self
    }

    /// Reuse an existing HTTP client. `http_timeout` is not applied to it.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Result<MediaPipeline, MediaError> {
        let http = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(self.config.http_timeout)
                .build()
                .map_err(|e| {
                    MediaError::ConfigurationError(format!("Failed to build HTTP client: {e}"))
                })?,
        };

        let credentials: Arc<dyn CredentialSource> = match (self.api_token, self.credentials) {
            (Some(token), _) => Arc::new(StaticCredentials::new().with_secret(REPLICATE, token)),
            (None, Some(credentials)) => credentials,
            (None, None) => Arc::new(EnvCredentials),
        };

        Ok(MediaPipeline {
            reconciler: JobReconciler::new(self.config.poll),
            config: self.config,
            http,
            registry: Arc::new(
                self.registry
                    .unwrap_or_else(|| ModelRegistry::shared().clone()),
            ),
            credentials,
            uploader: self.uploader.unwrap_or_else(|| Arc::new(NoopUploader)),
        })
    }
}
