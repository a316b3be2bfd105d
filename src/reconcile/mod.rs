//! Job reconciler
//!
//! Waits on an asynchronous provider job until it reaches a terminal state. The wait is an
//! explicit poll loop with a fixed interval, a cap on refreshes and an overall deadline, and it
//! stops as soon as the caller's [`CancelHandle`] fires. Intermediate states are never returned.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::MediaError;
use crate::types::GenerationJob;
use crate::utils::cancel::CancelHandle;

/// Backend able to report the current state of a job.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Fetch a fresh snapshot of `job`.
    async fn refresh(&self, job: &GenerationJob) -> Result<GenerationJob, MediaError>;
}

/// Bounds for the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before each refresh.
    pub interval: Duration,
    /// Maximum number of refreshes.
    pub max_attempts: u32,
    /// Wall-clock budget for the whole wait.
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 150,
            deadline: Duration::from_secs(300),
        }
    }
}

impl PollPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

/// Drives a pending job to a terminal state.
#[derive(Debug, Clone, Default)]
pub struct JobReconciler {
    policy: PollPolicy,
}

impl JobReconciler {
    pub const fn new(policy: PollPolicy) -> Self {
        Self { policy }
    }

    pub const fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Wait until `job` is terminal.
    ///
    /// Errors with `TimeoutError` when the deadline passes or the refresh cap is reached, with
    /// `CancelledError` when `cancel` fires, and with whatever the source reports otherwise.
    pub async fn wait(
        &self,
        source: &dyn JobSource,
        job: GenerationJob,
        cancel: &CancelHandle,
    ) -> Result<GenerationJob, MediaError> {
        let deadline = self.policy.deadline;
        let poll = tokio::time::timeout(deadline, self.poll(source, job));
        cancel
            .run(async {
                poll.await.map_err(|_| {
                    MediaError::TimeoutError(format!(
                        "Job did not reach a terminal state within {deadline:?}"
                    ))
                })?
            })
            .await
    }

    async fn poll(
        &self,
        source: &dyn JobSource,
        mut job: GenerationJob,
    ) -> Result<GenerationJob, MediaError> {
        let mut attempts = 0u32;
        loop {
            if job.is_terminal() {
                tracing::debug!(
                    job_id = ?job.id,
                    status = %job.status,
                    attempts,
                    "job reached terminal state"
                );
                return Ok(job);
            }
            if attempts >= self.policy.max_attempts {
                return Err(MediaError::TimeoutError(format!(
                    "Job still {} after {} polls",
                    job.status_text(),
                    attempts
                )));
            }

            tokio::time::sleep(self.policy.interval).await;
            let snapshot = source.refresh(&job).await?;
            attempts += 1;
            tracing::trace!(job_id = ?job.id, status = %snapshot.status, attempts, "polled job");
            job.advance(snapshot)?;
        }
    }
}
