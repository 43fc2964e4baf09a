use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::entities::ProcessingJob;
use crate::domain::repositories::{JobRepository, JobRepositoryError};

/// How long a finished job stays queryable.
pub const DEFAULT_JOB_RETENTION_MINUTES: i64 = 60;

/// Upload jobs live only as long as the process. Finished jobs are dropped
/// once they are older than the retention window.
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<Uuid, ProcessingJob>>,
    retention: Duration,
}

impl Default for InMemoryJobRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            retention: Duration::minutes(DEFAULT_JOB_RETENTION_MINUTES),
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }
}

fn evict_finished(jobs: &mut HashMap<Uuid, ProcessingJob>, retention: Duration) {
    let cutoff = Utc::now() - retention;
    let before = jobs.len();
    jobs.retain(|_, job| job.completed_at().is_none_or(|finished| finished > cutoff));
    if jobs.len() < before {
        debug!("Evicted {} finished upload jobs", before - jobs.len());
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn save(&self, job: &ProcessingJob) -> Result<(), JobRepositoryError> {
        let mut jobs = self.jobs.write().await;
        evict_finished(&mut jobs, self.retention);
        jobs.insert(job.id(), job.clone());
        Ok(())
    }

    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<ProcessingJob>, JobRepositoryError> {
        Ok(self.jobs.read().await.get(&job_id).cloned())
    }

    async fn find_active_jobs(&self) -> Result<Vec<ProcessingJob>, JobRepositoryError> {
        let mut active: Vec<ProcessingJob> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| job.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|job| job.created_at());
        Ok(active)
    }

    async fn update(&self, job: &ProcessingJob) -> Result<(), JobRepositoryError> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job.id()) {
            Some(stored) => {
                *stored = job.clone();
                Ok(())
            }
            None => Err(JobRepositoryError::NotFound(job.id())),
        }
    }
}
