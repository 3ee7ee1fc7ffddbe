//! In-memory scheduler: one spawned task per job, bounded by a permit pool, state in the registry.

use crate::{JobRegistry, JobRunner, Scheduler, SchedulerError};
use async_trait::async_trait;
use scrape_types::{ArtifactHandle, ArtifactStore, Job, JobId, JobStatus, Scraper};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Scrapes allowed to run at once; further jobs wait in `pending`.
    pub max_concurrent: usize,
    /// Registry bound; `None` keeps every job for the process lifetime.
    pub registry_capacity: Option<usize>,
    /// Deadline for a single job's scrape.
    pub job_timeout: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            registry_capacity: None,
            job_timeout: None,
        }
    }
}

pub struct InMemoryScheduler {
    registry: Arc<JobRegistry>,
    runner: Arc<JobRunner>,
    store: Arc<dyn ArtifactStore>,
}

impl InMemoryScheduler {
    pub fn new(
        scraper: Arc<dyn Scraper>,
        store: Arc<dyn ArtifactStore>,
        config: SchedulerConfig,
    ) -> Self {
        let registry = Arc::new(match config.registry_capacity {
            Some(cap) => JobRegistry::with_capacity(cap),
            None => JobRegistry::new(),
        });
        let runner = Arc::new(JobRunner::new(
            Arc::clone(&registry),
            scraper,
            Arc::clone(&store),
            config.max_concurrent,
            config.job_timeout,
        ));
        Self {
            registry,
            runner,
            store,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }
}

#[async_trait]
impl Scheduler for InMemoryScheduler {
    async fn submit(&self, query: &str, max_pages: u32) -> Result<JobId, SchedulerError> {
        let id = self.registry.create(query, max_pages).await?;
        tracing::info!(job_id = %id, query, max_pages, "scrape job submitted");

        let runner = Arc::clone(&self.runner);
        tokio::spawn(async move {
            if let Err(e) = runner.run(id).await {
                tracing::error!(job_id = %id, error = %e, "job runner contract violation");
            }
        });
        Ok(id)
    }

    async fn status(&self, id: JobId) -> Result<Job, SchedulerError> {
        Ok(self.registry.get(id).await?)
    }

    async fn download(&self, id: JobId) -> Result<(ArtifactHandle, Vec<u8>), SchedulerError> {
        let job = self.registry.get(id).await?;
        if job.status != JobStatus::Done {
            return Err(SchedulerError::NotReady(id));
        }
        let artifact = job
            .artifact
            .ok_or_else(|| SchedulerError::Internal(format!("job {} done without artifact", id)))?;
        let bytes = self.store.load(&artifact).await?;
        Ok((artifact, bytes))
    }
}
