//! Job registry: the single owner of job state.

use chrono::Utc;
use scrape_types::{ArtifactHandle, Job, JobId, JobStatus};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job {id} is {actual}, cannot move to {requested}")]
    InvalidState {
        id: JobId,
        actual: JobStatus,
        requested: JobStatus,
    },
}

#[derive(Default)]
struct Inner {
    jobs: HashMap<JobId, Job>,
    /// Terminal jobs in the order they finished; eviction candidates. Only
    /// tracked when a capacity is set.
    finished: VecDeque<JobId>,
}

/// Concurrency-safe map of job id to job.
///
/// Every transition replaces the stored job under the write lock, so readers
/// see either the previous snapshot or the next one, never a partial update.
/// With a capacity set, inserting past it evicts the oldest finished job;
/// pending and running jobs are never evicted.
pub struct JobRegistry {
    inner: RwLock<Inner>,
    capacity: Option<usize>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            capacity: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            capacity: Some(capacity),
        }
    }

    /// Validate the request and insert a fresh `pending` job.
    pub async fn create(&self, query: &str, max_pages: u32) -> Result<JobId, RegistryError> {
        if query.trim().is_empty() {
            return Err(RegistryError::InvalidRequest(
                "search_query required".to_string(),
            ));
        }
        if max_pages < 1 {
            return Err(RegistryError::InvalidRequest(
                "max_pages must be at least 1".to_string(),
            ));
        }

        let mut guard = self.inner.write().await;
        if let Some(cap) = self.capacity {
            while guard.jobs.len() >= cap {
                let Some(old) = guard.finished.pop_front() else {
                    break;
                };
                if guard.jobs.remove(&old).is_some() {
                    tracing::debug!(job_id = %old, "evicted finished job");
                }
            }
        }

        let mut id = JobId::new();
        while guard.jobs.contains_key(&id) {
            id = JobId::new();
        }
        let job = Job::pending(id, query.to_string(), max_pages, now_iso());
        guard.jobs.insert(id, job);
        Ok(id)
    }

    /// Snapshot of the job; later transitions do not affect it.
    pub async fn get(&self, id: JobId) -> Result<Job, RegistryError> {
        self.inner
            .read()
            .await
            .jobs
            .get(&id)
            .cloned()
            .ok_or(RegistryError::NotFound(id))
    }

    pub async fn transition_to_running(&self, id: JobId) -> Result<(), RegistryError> {
        self.transition(id, JobStatus::Running, |job| {
            job.message = Some("Scraping".to_string());
        })
        .await
    }

    pub async fn complete(
        &self,
        id: JobId,
        artifact: ArtifactHandle,
        message: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let message = message.into();
        self.transition(id, JobStatus::Done, move |job| {
            job.artifact = Some(artifact);
            job.message = Some(message);
        })
        .await
    }

    pub async fn fail(&self, id: JobId, message: impl Into<String>) -> Result<(), RegistryError> {
        let message = message.into();
        self.transition(id, JobStatus::Error, move |job| {
            job.artifact = None;
            job.message = Some(message);
        })
        .await
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.jobs.is_empty()
    }

    async fn transition(
        &self,
        id: JobId,
        next: JobStatus,
        apply: impl FnOnce(&mut Job),
    ) -> Result<(), RegistryError> {
        let mut guard = self.inner.write().await;
        let current = guard.jobs.get(&id).ok_or(RegistryError::NotFound(id))?;
        if !current.status.can_transition_to(next) {
            return Err(RegistryError::InvalidState {
                id,
                actual: current.status,
                requested: next,
            });
        }
        let mut updated = current.clone();
        updated.status = next;
        updated.updated_at = now_iso();
        apply(&mut updated);
        guard.jobs.insert(id, updated);
        if next.is_terminal() && self.capacity.is_some() {
            guard.finished.push_back(id);
        }
        Ok(())
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn handle(name: &str) -> ArtifactHandle {
        ArtifactHandle {
            location: format!("out/{name}"),
            file_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn create_rejects_empty_query_and_zero_pages() {
        let reg = JobRegistry::new();
        assert!(matches!(
            reg.create("", 1).await,
            Err(RegistryError::InvalidRequest(_))
        ));
        assert!(matches!(
            reg.create("   ", 3).await,
            Err(RegistryError::InvalidRequest(_))
        ));
        assert!(matches!(
            reg.create("laptop", 0).await,
            Err(RegistryError::InvalidRequest(_))
        ));
        assert!(reg.is_empty().await);
    }

    #[tokio::test]
    async fn created_job_is_pending_with_fixed_inputs() {
        let reg = JobRegistry::new();
        let id = reg.create("dell laptop", 2).await.unwrap();
        let job = reg.get(id).await.unwrap();
        assert_eq!(job.id, id);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.query, "dell laptop");
        assert_eq!(job.max_pages, 2);
        assert!(job.artifact.is_none());
        assert!(job.message.is_none());
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let reg = JobRegistry::new();
        let id = JobId::new();
        assert!(matches!(reg.get(id).await, Err(RegistryError::NotFound(x)) if x == id));
        assert!(matches!(
            reg.transition_to_running(id).await,
            Err(RegistryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn happy_path_sets_artifact_only_when_done() {
        let reg = JobRegistry::new();
        let id = reg.create("hp", 1).await.unwrap();

        reg.transition_to_running(id).await.unwrap();
        let running = reg.get(id).await.unwrap();
        assert_eq!(running.status, JobStatus::Running);
        assert!(running.artifact.is_none());

        reg.complete(id, handle("hp_a1b2c3.csv"), "Scraped 4 products")
            .await
            .unwrap();
        let done = reg.get(id).await.unwrap();
        assert_eq!(done.status, JobStatus::Done);
        assert_eq!(done.artifact, Some(handle("hp_a1b2c3.csv")));
        assert_eq!(done.message.as_deref(), Some("Scraped 4 products"));
        assert_eq!(done.query, "hp");
        assert_eq!(done.max_pages, 1);
    }

    #[tokio::test]
    async fn terminal_writes_require_running() {
        let reg = JobRegistry::new();
        let id = reg.create("asus", 1).await.unwrap();

        assert!(matches!(
            reg.complete(id, handle("x.csv"), "nope").await,
            Err(RegistryError::InvalidState { actual: JobStatus::Pending, .. })
        ));
        assert!(matches!(
            reg.fail(id, "nope").await,
            Err(RegistryError::InvalidState { .. })
        ));

        reg.transition_to_running(id).await.unwrap();
        reg.fail(id, "boom").await.unwrap();

        assert!(matches!(
            reg.complete(id, handle("x.csv"), "late").await,
            Err(RegistryError::InvalidState { actual: JobStatus::Error, .. })
        ));
        assert!(matches!(
            reg.transition_to_running(id).await,
            Err(RegistryError::InvalidState { .. })
        ));
        let job = reg.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.message.as_deref(), Some("boom"));
        assert!(job.artifact.is_none());
    }

    #[tokio::test]
    async fn snapshot_is_detached_from_registry() {
        let reg = JobRegistry::new();
        let id = reg.create("lenovo", 1).await.unwrap();
        let mut snapshot = reg.get(id).await.unwrap();
        snapshot.status = JobStatus::Done;
        snapshot.query = "tampered".to_string();

        let fresh = reg.get(id).await.unwrap();
        assert_eq!(fresh.status, JobStatus::Pending);
        assert_eq!(fresh.query, "lenovo");
    }

    #[tokio::test]
    async fn concurrent_creates_yield_distinct_ids() {
        let reg = Arc::new(JobRegistry::new());
        let mut handles = Vec::new();
        for i in 0..64 {
            let reg = Arc::clone(&reg);
            handles.push(tokio::spawn(async move {
                reg.create(&format!("query {i}"), 1).await.unwrap()
            }));
        }
        let mut ids = HashSet::new();
        for h in handles {
            ids.insert(h.await.unwrap());
        }
        assert_eq!(ids.len(), 64);
        assert_eq!(reg.len().await, 64);
    }

    #[tokio::test]
    async fn capacity_evicts_oldest_finished_job_only() {
        let reg = JobRegistry::with_capacity(2);
        let first = reg.create("first", 1).await.unwrap();
        let second = reg.create("second", 1).await.unwrap();
        reg.transition_to_running(first).await.unwrap();
        reg.fail(first, "gone").await.unwrap();

        let third = reg.create("third", 1).await.unwrap();
        assert!(matches!(reg.get(first).await, Err(RegistryError::NotFound(_))));
        assert_eq!(reg.len().await, 2);

        // No finished job left to evict: the insert still succeeds.
        let fourth = reg.create("fourth", 1).await.unwrap();
        assert_eq!(reg.len().await, 3);
        for id in [second, third, fourth] {
            assert_eq!(reg.get(id).await.unwrap().status, JobStatus::Pending);
        }
    }

    #[tokio::test]
    async fn unbounded_registry_keeps_no_eviction_queue() {
        let reg = JobRegistry::new();
        for i in 0..16 {
            let id = reg.create(&format!("q{i}"), 1).await.unwrap();
            reg.transition_to_running(id).await.unwrap();
            reg.complete(id, handle("a.csv"), "done").await.unwrap();
        }
        assert_eq!(reg.len().await, 16);
        assert!(reg.inner.read().await.finished.is_empty());
    }
}
