//! Scheduler trait: submit a scrape job, poll its status, download its artifact.

use crate::RegistryError;
use async_trait::async_trait;
use scrape_types::{ArtifactError, ArtifactHandle, Job, JobId};

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job not ready: {0}")]
    NotReady(JobId),
    #[error("artifact: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("scheduler error: {0}")]
    Internal(String),
}

impl From<RegistryError> for SchedulerError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::InvalidRequest(msg) => SchedulerError::InvalidRequest(msg),
            RegistryError::NotFound(id) => SchedulerError::NotFound(id),
            other @ RegistryError::InvalidState { .. } => {
                SchedulerError::Internal(other.to_string())
            }
        }
    }
}

/// Asynchronous scrape jobs: `submit` returns immediately, the scrape runs in the background.
///
/// Contract: `status` and `download` return `NotFound` for ids never issued (or
/// evicted); `download` returns `NotReady` until the job is `done`.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Register a job and dispatch its runner; does not wait for the scrape.
    async fn submit(&self, query: &str, max_pages: u32) -> Result<JobId, SchedulerError>;

    /// Current snapshot of the job.
    async fn status(&self, id: JobId) -> Result<Job, SchedulerError>;

    /// Artifact of a finished job.
    async fn download(&self, id: JobId) -> Result<(ArtifactHandle, Vec<u8>), SchedulerError>;
}
