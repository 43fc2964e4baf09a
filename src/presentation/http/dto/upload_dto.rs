use serde::{Deserialize, Serialize};

use crate::application::services::IngestionSummary;
use crate::application::use_cases::BackfillReport;
use crate::presentation::http::dto::{ApiError, QueueUploadResponseDto};

#[derive(Debug, Serialize)]
pub struct IngestionSummaryDto {
    pub filename: String,
    pub book_id: i32,
    pub title: String,
    pub authors: Vec<String>,
    pub pages: i32,
    pub text_chunks: usize,
    pub code_chunks: usize,
    pub total_chunks: usize,
    pub embedded: usize,
    pub missing_embeddings: usize,
    pub processing_time_ms: u64,
}

impl From<IngestionSummary> for IngestionSummaryDto {
    fn from(summary: IngestionSummary) -> Self {
        Self {
            total_chunks: summary.text_chunks + summary.code_chunks,
            filename: summary.filename,
            book_id: summary.book_id,
            title: summary.title,
            authors: summary.authors,
            pages: summary.pages,
            text_chunks: summary.text_chunks,
            code_chunks: summary.code_chunks,
            embedded: summary.embedded,
            missing_embeddings: summary.missing_embeddings,
            processing_time_ms: summary.processing_time_ms,
        }
    }
}

/// One file of a multi-file synchronous upload.
#[derive(Debug, Serialize)]
pub struct UploadResultDto {
    pub filename: String,
    pub success: bool,
    pub summary: Option<IngestionSummaryDto>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Serialize)]
pub struct BatchUploadResponseDto {
    pub results: Vec<UploadResultDto>,
    pub succeeded: usize,
    pub failed: usize,
}

/// One file of an asynchronous upload request.
#[derive(Debug, Serialize)]
pub struct QueuedUploadDto {
    pub filename: String,
    pub job: Option<QueueUploadResponseDto>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct BackfillRequestDto {
    pub batch_size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct BackfillResponseDto {
    pub scanned: usize,
    pub embedded: usize,
    pub failed: usize,
}

impl From<BackfillReport> for BackfillResponseDto {
    fn from(report: BackfillReport) -> Self {
        Self {
            scanned: report.scanned,
            embedded: report.embedded,
            failed: report.failed,
        }
    }
}
