use async_trait::async_trait;
use uuid::Uuid;

use crate::application::services::DocumentDetails;

#[derive(Debug, thiserror::Error)]
pub enum JobQueueError {
    #[error("Job queue is closed")]
    Closed,
}

/// Work item handed to the background upload worker.
#[derive(Debug, Clone)]
pub struct UploadTask {
    pub job_id: Uuid,
    pub filename: String,
    pub data: Vec<u8>,
    pub details: DocumentDetails,
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, task: UploadTask) -> Result<(), JobQueueError>;

    /// Tasks accepted but not yet picked up by the worker.
    async fn pending(&self) -> usize;
}
