//! Normalized generation outcomes

use serde::Serialize;

use super::capability::Capability;
use crate::error::{ErrorKind, ResponseCategory};

/// Reference to generated media.
///
/// Image-to-image results are returned inline as a base64 data URI; image-to-video results are
/// returned as a remote URL because video payloads are too large to inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MediaReference {
    Inline(String),
    Remote(String),
}

impl MediaReference {
    /// Wrap a base64 payload in a data URI.
    pub fn inline_base64(mime_type: &str, base64_payload: &str) -> Self {
        Self::Inline(format!("data:{mime_type};base64,{base64_payload}"))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Inline(s) | Self::Remote(s) => s,
        }
    }

    /// Whether the reference can be handed to a caller.
    ///
    /// Remote references must be absolute http(s) URLs; inline references must be data URIs
    /// with a non-empty payload.
    pub fn is_usable(&self) -> bool {
        match self {
            Self::Remote(url) => url.starts_with("https://") || url.starts_with("http://"),
            Self::Inline(uri) => uri.starts_with("data:")
                && uri
                    .split_once(',')
                    .is_some_and(|(_, payload)| !payload.is_empty()),
        }
    }
}

/// Uniform result returned to callers regardless of backend or execution mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationOutcome {
    Success {
        media: MediaReference,
    },
    Failure {
        error_kind: ErrorKind,
        category: ResponseCategory,
        message: String,
    },
}

impl GenerationOutcome {
    pub fn success(media: MediaReference) -> Self {
        Self::Success { media }
    }

    /// Failure using the kind's default category.
    pub fn failure(error_kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failure {
            error_kind,
            category: error_kind.category(),
            message: message.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn media(&self) -> Option<&MediaReference> {
        match self {
            Self::Success { media } => Some(media),
            Self::Failure { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error_kind, .. } => Some(*error_kind),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { message, .. } => Some(message),
        }
    }

    /// HTTP status for the transport layer.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Success { .. } => 200,
            Self::Failure { category, .. } => category.status_code(),
        }
    }

    /// Wire body: `{"imageUrl": ...}` / `{"videoUrl": ...}` on success,
    /// `{"error": {"kind", "category", "message"}}` on failure.
    pub fn response_body(&self, capability: Capability) -> serde_json::Value {
        match self {
            Self::Success { media } => {
                let mut body = serde_json::Map::new();
                body.insert(
                    capability.response_field().to_string(),
                    serde_json::Value::String(media.as_str().to_string()),
                );
                serde_json::Value::Object(body)
            }
            Self::Failure {
                error_kind,
                category,
                message,
            } => serde_json::json!({
                "error": {
                    "kind": error_kind,
                    "category": category,
                    "message": message,
                }
            }),
        }
    }
}
