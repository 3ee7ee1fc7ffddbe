//! Job runner: drives one job from `pending` to a terminal state.

use crate::registry::{JobRegistry, RegistryError};
use scrape_types::{
    ArtifactError, ArtifactHandle, ArtifactStore, JobId, JobStatus, ScrapeError, Scraper,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::Instrument;

/// Why a single job ended in `error`. The display form is the job's message.
#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
    #[error("failed to write artifact: {0}")]
    Artifact(#[from] ArtifactError),
}

/// Executes scrapes for submitted jobs and records their outcome in the registry.
///
/// Scraper faults, scraper panics, deadline expiry and artifact write failures
/// all end in `fail`; none of them propagate to the caller. The only error
/// returned is a registry contract violation.
pub struct JobRunner {
    registry: Arc<JobRegistry>,
    scraper: Arc<dyn Scraper>,
    store: Arc<dyn ArtifactStore>,
    permits: Arc<Semaphore>,
    job_timeout: Option<Duration>,
}

impl JobRunner {
    pub fn new(
        registry: Arc<JobRegistry>,
        scraper: Arc<dyn Scraper>,
        store: Arc<dyn ArtifactStore>,
        max_concurrent: usize,
        job_timeout: Option<Duration>,
    ) -> Self {
        Self {
            registry,
            scraper,
            store,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            job_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Run job `id` to completion. Waits for a concurrency permit while the job stays `pending`.
    pub async fn run(&self, id: JobId) -> Result<JobStatus, RegistryError> {
        let span = tracing::info_span!("scrape_job", job_id = %id);
        self.run_inner(id).instrument(span).await
    }

    async fn run_inner(&self, id: JobId) -> Result<JobStatus, RegistryError> {
        let job = self.registry.get(id).await?;
        let _permit = self.permits.acquire().await;

        self.registry.transition_to_running(id).await?;
        tracing::info!(query = %job.query, max_pages = job.max_pages, "scrape started");

        match self.execute(&job.query, job.max_pages).await {
            Ok((artifact, count)) => {
                tracing::info!(count, file = %artifact.file_name, "scrape done");
                self.registry
                    .complete(id, artifact, format!("Scraped {} products", count))
                    .await?;
                Ok(JobStatus::Done)
            }
            Err(e) => {
                tracing::warn!(error = %e, "scrape failed");
                self.registry.fail(id, e.to_string()).await?;
                Ok(JobStatus::Error)
            }
        }
    }

    async fn execute(
        &self,
        query: &str,
        max_pages: u32,
    ) -> Result<(ArtifactHandle, usize), RunError> {
        let records = self.scrape(query, max_pages).await?;
        let artifact = self.store.save(query, &records).await?;
        Ok((artifact, records.len()))
    }

    /// Scraper call on its own task so a panic surfaces as a join error.
    async fn scrape(
        &self,
        query: &str,
        max_pages: u32,
    ) -> Result<Vec<scrape_types::ProductRecord>, ScrapeError> {
        let scraper = Arc::clone(&self.scraper);
        let owned_query = query.to_string();
        let task = tokio::spawn(async move { scraper.scrape(&owned_query, max_pages).await });
        let abort = task.abort_handle();

        let joined = match self.job_timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    abort.abort();
                    return Err(ScrapeError::Timeout(format!(
                        "job exceeded {}s",
                        limit.as_secs_f64()
                    )));
                }
            },
            None => task.await,
        };

        match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(ScrapeError::Other("scraper panicked".to_string())),
            Err(e) => Err(ScrapeError::Other(format!("scraper task ended: {}", e))),
        }
    }
}
