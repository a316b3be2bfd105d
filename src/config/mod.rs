//! Credentials and runtime settings

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;

use crate::providers::replicate::DEFAULT_BASE_URL;
use crate::reconcile::PollPolicy;
use crate::registry::catalog::REPLICATE;

/// Environment variable holding the Replicate API token.
pub const REPLICATE_API_TOKEN_ENV: &str = "REPLICATE_API_TOKEN";

/// Default per-request HTTP timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Supplies backend API tokens.
pub trait CredentialSource: Send + Sync {
    /// Token for `provider`, or `None` when it is not configured.
    fn api_token(&self, provider: &str) -> Option<SecretString>;
}

/// Reads tokens from the process environment on every lookup. Empty values count as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    /// Environment variable consulted for `provider`.
    pub fn env_key(provider: &str) -> Option<&'static str> {
        match provider {
            REPLICATE => Some(REPLICATE_API_TOKEN_ENV),
            _ => None,
        }
    }
}

impl CredentialSource for EnvCredentials {
    fn api_token(&self, provider: &str) -> Option<SecretString> {
        let key = Self::env_key(provider)?;
        std::env::var(key)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::from)
    }
}

/// Fixed tokens, keyed by provider id.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    tokens: HashMap<String, SecretString>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(self, provider: impl Into<String>, token: impl Into<String>) -> Self {
        self.with_secret(provider, SecretString::from(token.into()))
    }

    pub fn with_secret(mut self, provider: impl Into<String>, token: SecretString) -> Self {
        self.tokens.insert(provider.into(), token);
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn api_token(&self, provider: &str) -> Option<SecretString> {
        self.tokens.get(provider).cloned()
    }
}

/// Runtime settings for the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConfig {
    /// Replicate API root.
    pub base_url: String,
    /// Timeout applied to each HTTP call.
    pub http_timeout: Duration,
    /// Bounds for asynchronous jobs.
    pub poll: PollPolicy,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            poll: PollPolicy::default(),
        }
    }
}
