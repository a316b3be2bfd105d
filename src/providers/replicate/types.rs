//! Replicate prediction wire types

use serde::{Deserialize, Serialize};

use crate::types::JobStatus;

/// Prediction lifecycle as reported by Replicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    #[serde(alias = "cancelled", alias = "aborted")]
    Canceled,
}

impl PredictionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }

    /// Map onto the job state machine. Cancellation on the backend is a failure.
    pub const fn job_status(self) -> JobStatus {
        match self {
            Self::Starting => JobStatus::Created,
            Self::Processing => JobStatus::Running,
            Self::Succeeded => JobStatus::Succeeded,
            Self::Failed | Self::Canceled => JobStatus::Failed,
        }
    }
}

/// Links returned with a prediction.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PredictionUrls {
    #[serde(default)]
    pub get: Option<String>,
    #[serde(default)]
    pub cancel: Option<String>,
    #[serde(default)]
    pub stream: Option<String>,
}

/// Prediction resource (`POST /predictions`, `GET /predictions/{id}`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub logs: Option<String>,
    #[serde(default)]
    pub urls: Option<PredictionUrls>,
}

impl Prediction {
    /// String outputs in order. A bare string output counts as a single entry.
    pub fn output_strings(&self) -> Vec<&str> {
        match &self.output {
            Some(serde_json::Value::String(s)) => vec![s.as_str()],
            Some(serde_json::Value::Array(items)) => {
                items.iter().filter_map(|item| item.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Whether the backend attached a non-empty error value.
    pub fn has_error(&self) -> bool {
        match &self.error {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    pub fn poll_url(&self) -> Option<&str> {
        self.urls.as_ref().and_then(|u| u.get.as_deref())
    }
}

/// Body for `POST /predictions` (pinned version) and `POST /models/{owner}/{name}/predictions`.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePredictionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub input: serde_json::Value,
}

/// Error body shape (`{"title", "detail", "status"}`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}
