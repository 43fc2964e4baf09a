use serde::Serialize;
use uuid::Uuid;

use crate::application::use_cases::{GetJobStatusResponse, QueueUploadResponse};
use crate::domain::entities::{JobResult, ProcessingJob};

#[derive(Debug, Serialize)]
pub struct JobStatusDto {
    pub job_id: Uuid,
    pub filename: String,
    pub status: String,
    pub progress: f32,
    pub message: Option<String>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub error_message: Option<String>,
    pub result_summary: Option<JobResultDto>,
    pub duration_ms: Option<i64>,
    pub is_terminal: bool,
}

#[derive(Debug, Serialize)]
pub struct JobResultDto {
    pub pages: i32,
    pub text_chunks: i32,
    pub code_chunks: i32,
    pub embedded: i32,
    pub missing_embeddings: i32,
    pub processing_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct QueueUploadResponseDto {
    pub job_id: Uuid,
    pub filename: String,
    pub status: String,
    pub status_url: String,
}

impl From<QueueUploadResponse> for QueueUploadResponseDto {
    fn from(response: QueueUploadResponse) -> Self {
        Self {
            status_url: format!("/upload/status/{}", response.job_id),
            job_id: response.job_id,
            filename: response.filename,
            status: response.status.to_string(),
        }
    }
}

impl From<GetJobStatusResponse> for JobStatusDto {
    fn from(response: GetJobStatusResponse) -> Self {
        Self::from_job_with_duration(response.job, response.duration)
    }
}

impl JobStatusDto {
    pub fn from_job(job: ProcessingJob) -> Self {
        let duration = job.duration();
        Self::from_job_with_duration(job, duration)
    }

    pub fn from_job_with_duration(job: ProcessingJob, duration: Option<chrono::Duration>) -> Self {
        Self {
            job_id: job.id(),
            filename: job.filename().to_string(),
            status: job.status().to_string(),
            progress: job.progress(),
            message: job.message().map(|s| s.to_string()),
            created_at: job.created_at().to_rfc3339(),
            started_at: job.started_at().map(|dt| dt.to_rfc3339()),
            completed_at: job.completed_at().map(|dt| dt.to_rfc3339()),
            error_message: job.error_message().map(|s| s.to_string()),
            result_summary: job.result_summary().map(JobResultDto::from),
            duration_ms: duration.map(|d| d.num_milliseconds()),
            is_terminal: job.status().is_terminal(),
        }
    }
}

impl From<&JobResult> for JobResultDto {
    fn from(result: &JobResult) -> Self {
        Self {
            pages: result.pages,
            text_chunks: result.text_chunks,
            code_chunks: result.code_chunks,
            embedded: result.embedded,
            missing_embeddings: result.missing_embeddings,
            processing_time_ms: result.processing_time_ms,
        }
    }
}
