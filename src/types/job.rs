//! Provider job snapshots and the job state machine
//!
//! A `GenerationJob` is created by an adapter when it submits work, advanced only by the
//! reconciler while it polls (or finalized directly by a synchronous adapter), and dropped
//! once the outcome has been normalized.

use std::fmt;

use serde::Serialize;

use super::outcome::MediaReference;
use crate::error::MediaError;

/// Lifecycle state of a provider job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Created,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::Running => 1,
            Self::Succeeded | Self::Failed => 2,
        }
    }

    /// Whether moving from `self` to `next` is a legal forward transition.
    ///
    /// Staying put is always allowed. Terminal states never change.
    pub const fn can_transition_to(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return self as u8 == next as u8;
        }
        next.rank() >= self.rank()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error attached to a job by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorDetail {
    /// Human-readable message, when the backend gave one.
    pub message: Option<String>,
    /// Original error value as returned by the backend.
    pub raw: Option<serde_json::Value>,
}

impl ErrorDetail {
    /// Build from a backend error value (string or object).
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        match &value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.trim().is_empty() => None,
            serde_json::Value::String(s) => Some(Self {
                message: Some(s.clone()),
                raw: Some(value),
            }),
            serde_json::Value::Object(map) => Some(Self {
                message: map
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string),
                raw: Some(value),
            }),
            _ => Some(Self {
                message: None,
                raw: Some(value),
            }),
        }
    }

    /// Message if present, otherwise the raw value rendered as JSON.
    pub fn describe(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        self.raw
            .as_ref()
            .map(|raw| raw.to_string())
            .unwrap_or_default()
    }
}

/// Snapshot of one provider job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationJob {
    /// Provider-assigned id (asynchronous jobs only).
    pub id: Option<String>,
    pub status: JobStatus,
    /// Status text exactly as the backend reported it (e.g. `canceled`).
    pub provider_status: Option<String>,
    pub output: Option<MediaReference>,
    pub error_detail: Option<ErrorDetail>,
    /// Non-fatal warnings reported alongside a result.
    pub warnings: Vec<String>,
    /// Tail of backend logs, kept for failure messages.
    pub logs: Option<String>,
    /// Backend URL to refresh this job from.
    pub poll_url: Option<String>,
    /// The backend rejected the job while creating it.
    pub failed_on_creation: bool,
}

impl GenerationJob {
    pub fn new(status: JobStatus) -> Self {
        Self {
            id: None,
            status,
            provider_status: None,
            output: None,
            error_detail: None,
            warnings: Vec::new(),
            logs: None,
            poll_url: None,
            failed_on_creation: false,
        }
    }

    /// A finished synchronous job carrying `output`.
    pub fn succeeded(output: Option<MediaReference>) -> Self {
        Self {
            output,
            ..Self::new(JobStatus::Succeeded)
        }
    }

    /// A finished job that failed with `detail`.
    pub fn failed(detail: Option<ErrorDetail>) -> Self {
        Self {
            error_detail: detail,
            ..Self::new(JobStatus::Failed)
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Status text for messages, preferring the backend's own wording.
    pub fn status_text(&self) -> &str {
        self.provider_status
            .as_deref()
            .unwrap_or(self.status.as_str())
    }

    /// Fold a fresh backend snapshot into this job.
    ///
    /// A backend reporting a step backwards (running to created) keeps the current status.
    /// Any change after a terminal state is rejected.
    pub fn advance(&mut self, snapshot: GenerationJob) -> Result<(), MediaError> {
        if !self.status.can_transition_to(snapshot.status) {
            if self.status.is_terminal() {
                return Err(MediaError::InvalidTransitionError {
                    from: self.status,
                    to: snapshot.status,
                });
            }
            tracing::debug!(
                job_id = ?self.id,
                from = %self.status,
                to = %snapshot.status,
                "ignoring backwards job status"
            );
        } else {
            self.status = snapshot.status;
        }

        if snapshot.id.is_some() {
            self.id = snapshot.id;
        }
        if snapshot.poll_url.is_some() {
            self.poll_url = snapshot.poll_url;
        }
        self.provider_status = snapshot.provider_status;
        self.output = snapshot.output;
        self.error_detail = snapshot.error_detail;
        self.logs = snapshot.logs;
        self.warnings = snapshot.warnings;
        Ok(())
    }
}
