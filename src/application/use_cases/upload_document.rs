use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::application::ports::DocumentExtractionError;
use crate::application::services::{
    DocumentDetails, DocumentProcessingError, DocumentProcessorService, IngestionSummary,
};

#[derive(Debug, thiserror::Error)]
pub enum UploadDocumentError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Duplicate document: {0}")]
    Duplicate(String),
    #[error("Extraction error: {0}")]
    ExtractionError(String),
    #[error("Processing error: {0}")]
    ProcessingError(String),
}

impl From<DocumentProcessingError> for UploadDocumentError {
    fn from(error: DocumentProcessingError) -> Self {
        match error {
            DocumentProcessingError::Duplicate(filename) => UploadDocumentError::Duplicate(filename),
            DocumentProcessingError::ExtractionError(e @ DocumentExtractionError::NoText) => {
                UploadDocumentError::ValidationError(e.to_string())
            }
            DocumentProcessingError::ExtractionError(e) => {
                UploadDocumentError::ExtractionError(e.to_string())
            }
            other => UploadDocumentError::ProcessingError(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UploadDocumentRequest {
    pub file: UploadedFile,
    pub details: DocumentDetails,
}

/// Per-file result of a synchronous batch upload.
#[derive(Debug)]
pub struct UploadOutcome {
    pub filename: String,
    pub result: Result<IngestionSummary, UploadDocumentError>,
}

/// Synchronous upload: the document is fully ingested before returning.
pub struct UploadDocumentUseCase {
    document_processor: Arc<DocumentProcessorService>,
    batch_delay: Duration,
}

impl UploadDocumentUseCase {
    pub fn new(document_processor: Arc<DocumentProcessorService>, batch_delay: Duration) -> Self {
        Self {
            document_processor,
            batch_delay,
        }
    }

    pub async fn execute(
        &self,
        request: UploadDocumentRequest,
    ) -> Result<IngestionSummary, UploadDocumentError> {
        let UploadedFile {
            filename,
            content_type,
            data,
        } = request.file;

        validate_upload(&self.document_processor, &filename, content_type.as_deref(), &data)?;

        let summary = self
            .document_processor
            .ingest(&filename, data, &request.details)
            .await?;
        Ok(summary)
    }

    /// Files are ingested one after another with `batch_delay` between them.
    /// A failing file does not stop the batch.
    pub async fn execute_batch(
        &self,
        files: Vec<UploadedFile>,
        details: DocumentDetails,
    ) -> Vec<UploadOutcome> {
        let total = files.len();
        let mut outcomes = Vec::with_capacity(total);

        for (position, file) in files.into_iter().enumerate() {
            if position > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            let filename = file.filename.clone();
            let result = self
                .execute(UploadDocumentRequest {
                    file,
                    details: details.clone(),
                })
                .await;
            if let Err(e) = &result {
                warn!("Batch upload of {} failed: {}", filename, e);
            }
            outcomes.push(UploadOutcome { filename, result });
        }

        let succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count();
        info!("Batch upload finished: {}/{} documents ingested", succeeded, total);
        outcomes
    }
}

pub(crate) fn validate_upload(
    document_processor: &DocumentProcessorService,
    filename: &str,
    content_type: Option<&str>,
    data: &[u8],
) -> Result<(), UploadDocumentError> {
    if filename.trim().is_empty() {
        return Err(UploadDocumentError::ValidationError(
            "File name is required".to_string(),
        ));
    }
    if data.is_empty() {
        return Err(UploadDocumentError::ValidationError(format!(
            "{} is empty",
            filename
        )));
    }
    if !document_processor.can_extract(content_type, filename) {
        return Err(UploadDocumentError::ValidationError(format!(
            "{} is not a PDF",
            filename
        )));
    }
    Ok(())
}
