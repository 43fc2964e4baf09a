use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use crate::application::services::DocumentDetails;
use crate::application::use_cases::{
    QueueUploadError, QueueUploadUseCase, UploadDocumentError, UploadDocumentRequest,
    UploadDocumentUseCase, UploadedFile,
};
use crate::presentation::http::dto::{
    ApiError, ApiResponse, BatchUploadResponseDto, IngestionSummaryDto, QueueUploadResponseDto,
    QueuedUploadDto, UploadResultDto,
};

pub struct UploadHandler {
    upload_use_case: Arc<UploadDocumentUseCase>,
    queue_upload_use_case: Arc<QueueUploadUseCase>,
}

/// Files and catalog fields of one multipart upload form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<UploadedFile>,
    pub details: DocumentDetails,
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Reads every part of the form. Parts with a file name are documents; the
/// others are the optional catalog fields.
pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, String> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Malformed multipart body: {}", e))?
    {
        if let Some(file_name) = field.file_name().map(|name| name.to_string()) {
            let content_type = field.content_type().map(|ct| ct.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| format!("Failed to read {}: {}", file_name, e))?
                .to_vec();

            form.files.push(UploadedFile {
                filename: file_name,
                content_type,
                data,
            });
            continue;
        }

        let name = field.name().unwrap_or_default().to_string();
        let value = field
            .text()
            .await
            .map_err(|e| format!("Failed to read field {}: {}", name, e))?;
        let Some(value) = non_empty(value) else {
            continue;
        };

        let details = &mut form.details;
        match name.as_str() {
            "title" => details.title = Some(value),
            "author" => details.author = Some(value),
            "category" => details.category = Some(value),
            "mc_press_url" => details.mc_press_url = Some(value),
            "article_url" => details.article_url = Some(value),
            "document_type" => details.document_type = Some(value.parse()?),
            "year" => {
                details.year = Some(
                    value
                        .parse()
                        .map_err(|_| format!("Invalid year: {}", value))?,
                )
            }
            other => warn!("Ignoring unknown upload field '{}'", other),
        }
    }

    Ok(form)
}

fn upload_error_parts(error: &UploadDocumentError) -> (StatusCode, &'static str) {
    match error {
        UploadDocumentError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
        UploadDocumentError::Duplicate(_) => (StatusCode::CONFLICT, "DUPLICATE_DOCUMENT"),
        UploadDocumentError::ExtractionError(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "EXTRACTION_FAILED")
        }
        UploadDocumentError::ProcessingError(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "PROCESSING_FAILED")
        }
    }
}

fn queue_error_parts(error: &QueueUploadError) -> (StatusCode, &'static str) {
    match error {
        QueueUploadError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
        QueueUploadError::RepositoryError(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "JOB_STORE_FAILED")
        }
        QueueUploadError::QueueError(_) => (StatusCode::SERVICE_UNAVAILABLE, "QUEUE_UNAVAILABLE"),
    }
}

fn bad_form(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(
            "INVALID_FORM".to_string(),
            message,
            None,
        )),
    )
        .into_response()
}

fn no_file() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(
            "NO_FILE_PROVIDED".to_string(),
            "No file provided in the request".to_string(),
            None,
        )),
    )
        .into_response()
}

impl UploadHandler {
    pub fn new(
        upload_use_case: Arc<UploadDocumentUseCase>,
        queue_upload_use_case: Arc<QueueUploadUseCase>,
    ) -> Self {
        Self {
            upload_use_case,
            queue_upload_use_case,
        }
    }

    /// Ingests the uploaded PDF(s) before responding. A single file answers
    /// with its summary or error status; several files answer with one result
    /// per file.
    pub async fn upload(
        State(handler): State<Arc<UploadHandler>>,
        multipart: Multipart,
    ) -> Response {
        let form = match read_upload_form(multipart).await {
            Ok(form) => form,
            Err(message) => return bad_form(message),
        };

        let UploadForm { mut files, details } = form;
        if files.is_empty() {
            return no_file();
        }

        if files.len() == 1 {
            let file = files.remove(0);
            return match handler
                .upload_use_case
                .execute(UploadDocumentRequest { file, details })
                .await
            {
                Ok(summary) => (
                    StatusCode::CREATED,
                    Json(ApiResponse::success(IngestionSummaryDto::from(summary))),
                )
                    .into_response(),
                Err(e) => {
                    let (status, code) = upload_error_parts(&e);
                    (
                        status,
                        Json(ApiResponse::<IngestionSummaryDto>::error(
                            code.to_string(),
                            e.to_string(),
                            None,
                        )),
                    )
                        .into_response()
                }
            };
        }

        let outcomes = handler.upload_use_case.execute_batch(files, details).await;
        let results: Vec<UploadResultDto> = outcomes
            .into_iter()
            .map(|outcome| match outcome.result {
                Ok(summary) => UploadResultDto {
                    filename: outcome.filename,
                    success: true,
                    summary: Some(IngestionSummaryDto::from(summary)),
                    error: None,
                },
                Err(e) => UploadResultDto {
                    filename: outcome.filename,
                    success: false,
                    summary: None,
                    error: Some(ApiError {
                        code: upload_error_parts(&e).1.to_string(),
                        message: e.to_string(),
                        details: None,
                    }),
                },
            })
            .collect();

        let succeeded = results.iter().filter(|r| r.success).count();
        let dto = BatchUploadResponseDto {
            failed: results.len() - succeeded,
            succeeded,
            results,
        };
        (StatusCode::OK, Json(ApiResponse::success(dto))).into_response()
    }

    /// Queues each PDF for the background worker and answers with job ids.
    pub async fn upload_async(
        State(handler): State<Arc<UploadHandler>>,
        multipart: Multipart,
    ) -> Response {
        let form = match read_upload_form(multipart).await {
            Ok(form) => form,
            Err(message) => return bad_form(message),
        };

        let UploadForm { mut files, details } = form;
        if files.is_empty() {
            return no_file();
        }

        if files.len() == 1 {
            let file = files.remove(0);
            return match handler.queue_upload_use_case.execute(file, details).await {
                Ok(response) => (
                    StatusCode::ACCEPTED,
                    Json(ApiResponse::success(QueueUploadResponseDto::from(response))),
                )
                    .into_response(),
                Err(e) => {
                    let (status, code) = queue_error_parts(&e);
                    (
                        status,
                        Json(ApiResponse::<QueueUploadResponseDto>::error(
                            code.to_string(),
                            e.to_string(),
                            None,
                        )),
                    )
                        .into_response()
                }
            };
        }

        let mut queued = Vec::with_capacity(files.len());
        for file in files {
            let filename = file.filename.clone();
            let entry = match handler
                .queue_upload_use_case
                .execute(file, details.clone())
                .await
            {
                Ok(response) => QueuedUploadDto {
                    filename,
                    job: Some(QueueUploadResponseDto::from(response)),
                    error: None,
                },
                Err(e) => QueuedUploadDto {
                    filename,
                    job: None,
                    error: Some(ApiError {
                        code: queue_error_parts(&e).1.to_string(),
                        message: e.to_string(),
                        details: None,
                    }),
                },
            };
            queued.push(entry);
        }

        (StatusCode::ACCEPTED, Json(ApiResponse::success(queued))).into_response()
    }
}
