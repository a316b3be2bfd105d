//! Core error types for the generation pipeline.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::types::{Capability, JobStatus};

/// Field-level validation failures keyed by the request's wire field name.
///
/// Fields are kept in sorted order so rendered messages are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Single-entry map, mostly for body-level failures.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for a field.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Remove all messages for a field.
    pub fn remove(&mut self, field: &str) -> Option<Vec<String>> {
        self.0.remove(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Merge `other` into `self`, keeping messages already recorded.
    pub fn extend(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Coarse error taxonomy reported in a failed `GenerationOutcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller supplied malformed input.
    Validation,
    /// Missing or rejected backend credential.
    Configuration,
    /// Model/provider pair is not registered for the capability.
    Unsupported,
    /// Backend finished the job and reported failure.
    ProviderReported,
    /// Backend reported success (or answered) without a usable payload.
    ProviderContract,
    /// Network failure, timeout or abort while talking to the backend.
    Transport,
    /// Backend rejected the credential (asynchronous path only).
    Unauthorized,
    /// Backend does not know the requested model or version.
    NotFound,
    /// Generated media could not be persisted.
    Storage,
}

impl ErrorKind {
    /// Default HTTP-mappable category for this kind.
    ///
    /// `Transport` maps to `ServerError` here; timeouts and aborts are refined by
    /// [`MediaError::category_for`].
    pub const fn category(self) -> ResponseCategory {
        match self {
            Self::Validation | Self::Unsupported => ResponseCategory::BadRequest,
            Self::Unauthorized => ResponseCategory::Unauthorized,
            Self::NotFound => ResponseCategory::NotFound,
            Self::Configuration
            | Self::ProviderReported
            | Self::ProviderContract
            | Self::Transport
            | Self::Storage => ResponseCategory::ServerError,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Configuration => "configuration",
            Self::Unsupported => "unsupported",
            Self::ProviderReported => "provider_reported",
            Self::ProviderContract => "provider_contract",
            Self::Transport => "transport",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::Storage => "storage",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP-mappable response category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCategory {
    BadRequest,
    Unauthorized,
    NotFound,
    Timeout,
    ServerError,
}

impl ResponseCategory {
    pub const fn status_code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::Timeout => 504,
            Self::ServerError => 500,
        }
    }
}

/// Error type returned by every pipeline stage.
#[derive(Error, Debug, Clone)]
pub enum MediaError {
    /// Request failed schema validation.
    #[error("Invalid input: {0}")]
    ValidationError(FieldErrors),

    /// Missing or invalid configuration, such as an absent API token.
    #[error("{0}")]
    ConfigurationError(String),

    /// Model/provider pair not present in the registry.
    #[error("Unsupported model: {provider}/{model_id}")]
    UnsupportedModelError { provider: String, model_id: String },

    /// Registered provider without an adapter for the capability.
    #[error("Unsupported {capability} provider: {provider}")]
    UnsupportedProviderError {
        capability: Capability,
        provider: String,
    },

    /// Backend answered with a non-success HTTP status.
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Connection-level failure.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Transport timeout or reconciler deadline.
    #[error("Timeout error: {0}")]
    TimeoutError(String),

    /// Caller aborted the request.
    #[error("Request cancelled: {0}")]
    CancelledError(String),

    /// Backend body could not be decoded.
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    /// Backend answered but broke its contract (no output, warnings, stuck job).
    #[error("{0}")]
    ProviderContractError(String),

    /// Backend reported a status change the job state machine forbids.
    #[error("Invalid job transition from {from} to {to}")]
    InvalidTransitionError { from: JobStatus, to: JobStatus },

    /// Result persistence failed.
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl MediaError {
    /// Create an API error from a status code and message.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// HTTP status reported by the backend, when there was one.
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Classify this error for a capability.
    ///
    /// Authentication failures are a server configuration problem on the synchronous
    /// image path but are surfaced verbatim as `Unauthorized` on the video path.
    pub fn kind_for(&self, capability: Capability) -> ErrorKind {
        match self {
            Self::ValidationError(_) => ErrorKind::Validation,
            Self::ConfigurationError(_) => ErrorKind::Configuration,
            Self::UnsupportedModelError { .. } | Self::UnsupportedProviderError { .. } => {
                ErrorKind::Unsupported
            }
            Self::ApiError { code, .. } => match code {
                401 | 403 => match capability {
                    Capability::ImageToImage => ErrorKind::Configuration,
                    Capability::ImageToVideo => ErrorKind::Unauthorized,
                },
                404 => ErrorKind::NotFound,
                422 => ErrorKind::Validation,
                _ => ErrorKind::Transport,
            },
            Self::HttpError(_) | Self::TimeoutError(_) | Self::CancelledError(_) => {
                ErrorKind::Transport
            }
            Self::ParseError(_)
            | Self::JsonError(_)
            | Self::ProviderContractError(_)
            | Self::InvalidTransitionError { .. } => ErrorKind::ProviderContract,
            Self::StorageError(_) => ErrorKind::Storage,
        }
    }

    /// Response category for this error, distinguishing timeouts from other transport faults.
    pub fn category_for(&self, capability: Capability) -> ResponseCategory {
        match self {
            Self::TimeoutError(_) | Self::CancelledError(_) => ResponseCategory::Timeout,
            _ => self.kind_for(capability).category(),
        }
    }

    /// Whether the failure was detected before any outbound call.
    pub const fn is_local(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::ConfigurationError(_)
                | Self::UnsupportedModelError { .. }
                | Self::UnsupportedProviderError { .. }
        )
    }
}
