use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::ProcessingJob;
use crate::domain::repositories::{JobRepository, JobRepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum GetJobStatusError {
    #[error("Job not found: {0}")]
    JobNotFound(Uuid),
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<JobRepositoryError> for GetJobStatusError {
    fn from(error: JobRepositoryError) -> Self {
        match error {
            JobRepositoryError::NotFound(id) => GetJobStatusError::JobNotFound(id),
            _ => GetJobStatusError::RepositoryError(error.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetJobStatusResponse {
    pub job: ProcessingJob,
    pub duration: Option<chrono::Duration>,
}

pub struct GetJobStatusUseCase {
    job_repository: Arc<dyn JobRepository>,
}

impl GetJobStatusUseCase {
    pub fn new(job_repository: Arc<dyn JobRepository>) -> Self {
        Self { job_repository }
    }

    pub async fn execute(&self, job_id: Uuid) -> Result<GetJobStatusResponse, GetJobStatusError> {
        let job = self
            .job_repository
            .find_by_id(job_id)
            .await?
            .ok_or(GetJobStatusError::JobNotFound(job_id))?;

        Ok(GetJobStatusResponse {
            duration: job.duration(),
            job,
        })
    }

    pub async fn get_active_jobs(&self) -> Result<Vec<ProcessingJob>, GetJobStatusError> {
        self.job_repository
            .find_active_jobs()
            .await
            .map_err(GetJobStatusError::from)
    }
}
