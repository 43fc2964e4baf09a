use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::application::ports::{JobQueue, JobQueueError, UploadTask};
use crate::application::services::{DocumentDetails, DocumentProcessorService};
use crate::application::use_cases::upload_document::{
    UploadDocumentError, UploadedFile, validate_upload,
};
use crate::domain::entities::ProcessingJob;
use crate::domain::repositories::{JobRepository, JobRepositoryError};
use crate::domain::value_objects::ProcessingStatus;

#[derive(Debug, thiserror::Error)]
pub enum QueueUploadError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Repository error: {0}")]
    RepositoryError(String),
    #[error("Queue error: {0}")]
    QueueError(String),
}

impl From<JobRepositoryError> for QueueUploadError {
    fn from(error: JobRepositoryError) -> Self {
        QueueUploadError::RepositoryError(error.to_string())
    }
}

impl From<JobQueueError> for QueueUploadError {
    fn from(error: JobQueueError) -> Self {
        QueueUploadError::QueueError(error.to_string())
    }
}

impl From<UploadDocumentError> for QueueUploadError {
    fn from(error: UploadDocumentError) -> Self {
        QueueUploadError::ValidationError(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct QueueUploadResponse {
    pub job_id: Uuid,
    pub filename: String,
    pub status: ProcessingStatus,
}

/// Records an upload job and hands the file to the background worker.
pub struct QueueUploadUseCase {
    job_repository: Arc<dyn JobRepository>,
    job_queue: Arc<dyn JobQueue>,
    document_processor: Arc<DocumentProcessorService>,
}

impl QueueUploadUseCase {
    pub fn new(
        job_repository: Arc<dyn JobRepository>,
        job_queue: Arc<dyn JobQueue>,
        document_processor: Arc<DocumentProcessorService>,
    ) -> Self {
        Self {
            job_repository,
            job_queue,
            document_processor,
        }
    }

    pub async fn execute(
        &self,
        file: UploadedFile,
        details: DocumentDetails,
    ) -> Result<QueueUploadResponse, QueueUploadError> {
        validate_upload(
            &self.document_processor,
            &file.filename,
            file.content_type.as_deref(),
            &file.data,
        )?;

        let job = ProcessingJob::new_upload(file.filename.clone());
        self.job_repository.save(&job).await?;

        let task = UploadTask {
            job_id: job.id(),
            filename: file.filename,
            data: file.data,
            details,
        };
        if let Err(e) = self.job_queue.enqueue(task).await {
            let mut failed = job.clone();
            if failed.fail_processing(e.to_string()).is_ok() {
                self.job_repository.update(&failed).await?;
            }
            return Err(e.into());
        }

        info!(
            "Queued {} as job {} ({} waiting)",
            job.filename(),
            job.id(),
            self.job_queue.pending().await
        );

        Ok(QueueUploadResponse {
            job_id: job.id(),
            filename: job.filename().to_string(),
            status: job.status(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ExtractedDocument;
    use crate::application::services::{EmbeddingService, RTSplitter};
    use crate::infrastructure::messaging::{InMemoryJobRepository, MpscJobQueue};
    use crate::test_support::{
        FakeEmbeddingProvider, FakeExtractor, InMemoryAuthorRepository, InMemoryBookRepository,
        InMemoryVectorIndex,
    };

    fn processor() -> Arc<DocumentProcessorService> {
        Arc::new(DocumentProcessorService::new(
            Arc::new(FakeExtractor::new(ExtractedDocument::default())),
            Arc::new(EmbeddingService::new(Arc::new(FakeEmbeddingProvider::new()))),
            Arc::new(InMemoryVectorIndex::new()),
            Arc::new(InMemoryBookRepository::new()),
            Arc::new(InMemoryAuthorRepository::new()),
            RTSplitter::default(),
        ))
    }

    fn pdf(name: &str) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            content_type: Some("application/pdf".to_string()),
            data: b"%PDF-1.4".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_queued_job_is_recorded_and_enqueued() {
        let jobs = Arc::new(InMemoryJobRepository::new());
        let (queue, receiver) = MpscJobQueue::create_pair();
        let use_case = QueueUploadUseCase::new(jobs.clone(), Arc::new(queue), processor());

        let response = use_case
            .execute(pdf("ile-concepts.pdf"), DocumentDetails::default())
            .await
            .unwrap();

        assert_eq!(response.status, ProcessingStatus::Queued);
        let stored = jobs.find_by_id(response.job_id).await.unwrap().unwrap();
        assert_eq!(stored.filename(), "ile-concepts.pdf");
        let task = receiver.recv().await.unwrap();
        assert_eq!(task.job_id, response.job_id);
    }

    #[tokio::test]
    async fn test_closed_queue_marks_job_failed() {
        let jobs = Arc::new(InMemoryJobRepository::new());
        let (queue, receiver) = MpscJobQueue::create_pair();
        drop(receiver);
        let use_case = QueueUploadUseCase::new(jobs.clone(), Arc::new(queue), processor());

        let result = use_case
            .execute(pdf("a.pdf"), DocumentDetails::default())
            .await;

        assert!(matches!(result, Err(QueueUploadError::QueueError(_))));
        assert!(jobs.find_active_jobs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_file_rejected() {
        let (queue, _receiver) = MpscJobQueue::create_pair();
        let use_case = QueueUploadUseCase::new(
            Arc::new(InMemoryJobRepository::new()),
            Arc::new(queue),
            processor(),
        );
        let mut file = pdf("a.pdf");
        file.data.clear();

        assert!(matches!(
            use_case.execute(file, DocumentDetails::default()).await,
            Err(QueueUploadError::ValidationError(_))
        ));
    }
}
