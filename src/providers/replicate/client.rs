//! Replicate HTTP client
//!
//! Thin wrapper over the predictions API. One instance is built per request with the
//! credential resolved for that request; the underlying `reqwest::Client` is shared.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::types::{ApiErrorBody, CreatePredictionRequest, Prediction};
use super::video::prediction_job;
use crate::error::MediaError;
use crate::reconcile::JobSource;
use crate::registry::ModelDescriptor;
use crate::types::GenerationJob;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com/v1";

/// How long a synchronous (`Prefer: wait`) request may be held open by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferWait {
    /// Return immediately with a pending prediction.
    No,
    /// Hold the connection open until the prediction finishes or the backend's limit is hit.
    Yes,
    /// Hold the connection open for at most this many seconds.
    Seconds(u32),
}

impl PreferWait {
    fn header_value(self) -> Option<String> {
        match self {
            Self::No => None,
            Self::Yes => Some("wait".to_string()),
            Self::Seconds(secs) => Some(format!("wait={secs}")),
        }
    }
}

/// Replicate predictions client.
#[derive(Clone)]
pub struct ReplicateClient {
    http: reqwest::Client,
    base_url: String,
    api_token: SecretString,
}

impl std::fmt::Debug for ReplicateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ReplicateClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_token: SecretString,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a prediction for `model`.
    ///
    /// Pinned ids (`owner/name:version`) go through `POST /predictions`; bare `owner/name` ids
    /// use the model's own predictions endpoint.
    pub async fn create_prediction(
        &self,
        model: &ModelDescriptor,
        input: serde_json::Value,
        prefer: PreferWait,
    ) -> Result<Prediction, MediaError> {
        let (url, body) = match model.version() {
            Some(version) => (
                self.url("predictions"),
                CreatePredictionRequest {
                    version: Some(version.to_string()),
                    input,
                },
            ),
            None => (
                self.url(&format!("models/{}/predictions", model.model_name())),
                CreatePredictionRequest {
                    version: None,
                    input,
                },
            ),
        };

        tracing::debug!(model = %model.model_id, url = %url, "creating replicate prediction");

        let mut builder = self
            .http
            .post(&url)
            .bearer_auth(self.api_token.expose_secret())
            .json(&body);
        if let Some(value) = prefer.header_value() {
            builder = builder.header("Prefer", value);
        }
        self.send_prediction(builder).await
    }

    /// Fetch the current state of a prediction by id.
    pub async fn get_prediction(&self, id: &str) -> Result<Prediction, MediaError> {
        let url = self.url(&format!("predictions/{id}"));
        self.get_prediction_at(&url).await
    }

    /// Fetch a prediction from an absolute URL under this client's base URL.
    pub async fn get_prediction_at(&self, url: &str) -> Result<Prediction, MediaError> {
        let builder = self
            .http
            .get(url)
            .bearer_auth(self.api_token.expose_secret());
        self.send_prediction(builder).await
    }

    /// Download a generated file. Delivery URLs are public, so no credential is sent.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MediaError::ApiError {
                code: status.as_u16(),
                message: format!(
                    "Failed to download generated media: {}",
                    error_message(status, &text)
                ),
                details: None,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn send_prediction(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<Prediction, MediaError> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::debug!(
                status = status.as_u16(),
                body = %text,
                "replicate returned an error status"
            );
            return Err(MediaError::ApiError {
                code: status.as_u16(),
                message: error_message(status, &text),
                details: serde_json::from_str(&text).ok(),
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            MediaError::ParseError(format!("Failed to parse prediction response: {e}"))
        })
    }
}

/// Best message from an error body: `detail`, then `title`, then the raw text.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .detail
        .or(parsed.title)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        })
}

impl ReplicateClient {
    /// Whether `url` has the base URL's scheme, host and port and sits under its path.
    fn is_api_url(&self, url: &str) -> bool {
        let (Ok(base), Ok(url)) = (reqwest::Url::parse(&self.base_url), reqwest::Url::parse(url))
        else {
            return false;
        };
        if base.scheme() != url.scheme()
            || base.host_str() != url.host_str()
            || base.port_or_known_default() != url.port_or_known_default()
        {
            return false;
        }
        let root = base.path().trim_end_matches('/');
        url.path()
            .strip_prefix(root)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

#[async_trait]
impl JobSource for ReplicateClient {
    async fn refresh(&self, job: &GenerationJob) -> Result<GenerationJob, MediaError> {
        // Only follow links that point back at the configured API root.
        let prediction = match (&job.poll_url, &job.id) {
            (Some(url), _) if self.is_api_url(url) => self.get_prediction_at(url).await?,
            (_, Some(id)) => self.get_prediction(id).await?,
            _ => {
                return Err(MediaError::ProviderContractError(
                    "Prediction has no id to poll".to_string(),
                ));
            }
        };
        Ok(prediction_job(&prediction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_detail() {
        let status = reqwest::StatusCode::UNPROCESSABLE_ENTITY;
        let body = r#"{"title":"Invalid input","detail":"duration must be 5 or 10"}"#;
        assert_eq!(error_message(status, body), "duration must be 5 or 10");
        assert_eq!(error_message(status, r#"{"title":"Invalid input"}"#), "Invalid input");
        assert_eq!(error_message(status, "plain failure"), "plain failure");
        assert_eq!(error_message(status, ""), "Unprocessable Entity");
    }

    #[test]
    fn prefer_header_values() {
        assert_eq!(PreferWait::No.header_value(), None);
        assert_eq!(PreferWait::Yes.header_value().as_deref(), Some("wait"));
        assert_eq!(PreferWait::Seconds(30).header_value().as_deref(), Some("wait=30"));
    }

    #[test]
    fn poll_urls_must_share_origin_and_path() {
        let token = || SecretString::from("r8_secret".to_string());
        let client = ReplicateClient::new(reqwest::Client::new(), "http://127.0.0.1:9", token());
        assert!(client.is_api_url("http://127.0.0.1:9/v1/predictions/p1"));
        assert!(!client.is_api_url("http://127.0.0.1:90/v1/predictions/p1"));
        assert!(!client.is_api_url("https://127.0.0.1:9/v1/predictions/p1"));
        assert!(!client.is_api_url("not a url"));

        let client = ReplicateClient::new(reqwest::Client::new(), DEFAULT_BASE_URL, token());
        assert!(client.is_api_url("https://api.replicate.com/v1/predictions/p1"));
        assert!(client.is_api_url("https://api.replicate.com:443/v1/predictions/p1"));
        assert!(!client.is_api_url("https://api.replicate.com/v10/predictions/p1"));
        assert!(!client.is_api_url("https://api.replicate.com.evil.test/v1/predictions/p1"));
    }

    #[test]
    fn debug_hides_token() {
        let client = ReplicateClient::new(
            reqwest::Client::new(),
            "https://api.replicate.com/v1/",
            SecretString::from("r8_secret".to_string()),
        );
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert!(!format!("{client:?}").contains("r8_secret"));
    }
}
