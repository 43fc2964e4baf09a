use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::application::ports::UploadTask;
use crate::application::services::DocumentProcessorService;
use crate::domain::entities::JobResult;
use crate::domain::repositories::JobRepository;
use crate::infrastructure::messaging::MpscJobQueueReceiver;

/// Drains the upload queue one task at a time, pausing `batch_delay`
/// between consecutive tasks.
pub struct UploadWorker {
    receiver: Arc<MpscJobQueueReceiver>,
    job_repository: Arc<dyn JobRepository>,
    document_processor: Arc<DocumentProcessorService>,
    batch_delay: Duration,
}

impl UploadWorker {
    pub fn new(
        receiver: Arc<MpscJobQueueReceiver>,
        job_repository: Arc<dyn JobRepository>,
        document_processor: Arc<DocumentProcessorService>,
    ) -> Self {
        Self {
            receiver,
            job_repository,
            document_processor,
            batch_delay: Duration::from_millis(1000),
        }
    }

    pub fn with_batch_delay(mut self, batch_delay: Duration) -> Self {
        self.batch_delay = batch_delay;
        self
    }

    pub async fn start(self) {
        info!("Upload worker started");
        let mut last_finished: Option<Instant> = None;

        while let Some(task) = self.receiver.recv().await {
            if let Some(finished) = last_finished {
                let elapsed = finished.elapsed();
                if elapsed < self.batch_delay {
                    tokio::time::sleep(self.batch_delay - elapsed).await;
                }
            }

            self.process_task(task).await;
            last_finished = Some(Instant::now());
        }

        info!("Upload queue closed, worker stopped");
    }

    pub async fn process_task(&self, task: UploadTask) {
        let job_id = task.job_id;
        let mut job = match self.job_repository.find_by_id(job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                warn!("Dropping upload of {}: job {} not found", task.filename, job_id);
                return;
            }
            Err(e) => {
                error!("Failed to load job {}: {}", job_id, e);
                return;
            }
        };

        if let Err(e) = job.start_processing() {
            warn!("Skipping job {}: {}", job_id, e);
            return;
        }
        if let Err(e) = self.job_repository.update(&job).await {
            error!("Failed to update job {} status: {}", job_id, e);
        }

        info!("Processing upload {} (job {})", task.filename, job_id);
        let outcome = self
            .document_processor
            .ingest(&task.filename, task.data, &task.details)
            .await;

        let transition = match outcome {
            Ok(summary) => {
                info!(
                    "Job {} completed: {} chunks in {} ms",
                    job_id,
                    summary.text_chunks + summary.code_chunks,
                    summary.processing_time_ms
                );
                job.complete_processing(JobResult {
                    pages: summary.pages,
                    text_chunks: summary.text_chunks as i32,
                    code_chunks: summary.code_chunks as i32,
                    embedded: summary.embedded as i32,
                    missing_embeddings: summary.missing_embeddings as i32,
                    processing_time_ms: summary.processing_time_ms,
                })
            }
            Err(e) => {
                warn!("Job {} failed: {}", job_id, e);
                job.fail_processing(e.to_string())
            }
        };

        if let Err(e) = transition {
            error!("Invalid state change for job {}: {}", job_id, e);
        }
        if let Err(e) = self.job_repository.update(&job).await {
            error!("Failed to save final state of job {}: {}", job_id, e);
        }
    }
}
