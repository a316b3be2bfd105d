//! Cancellation utilities
//!
//! Provides first-class cancellation handles for long-running generation requests.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::MediaError;

/// A handle that can be used to request cancellation.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Create a new cancel handle.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Request cancellation. Any pending submission or poll wait observing this handle
    /// stops at its next await point and the in-flight HTTP request is dropped.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A future that resolves when cancellation is requested.
    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// A child handle cancelled together with this one.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    /// Drive `future` to completion unless cancellation is requested first.
    pub async fn run<F, T>(&self, future: F) -> Result<T, MediaError>
    where
        F: Future<Output = Result<T, MediaError>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(MediaError::CancelledError(
                "request was aborted by the caller".to_string(),
            )),
            res = future => res,
        }
    }
}

/// Create a standalone cancel handle that can be shared across tasks.
pub fn new_cancel_handle() -> CancelHandle {
    CancelHandle::new()
}
