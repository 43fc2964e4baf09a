use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::application::use_cases::{
    DeleteDocumentError, DeleteDocumentUseCase, DocumentAuthorsError, DocumentAuthorsUseCase,
    ListDocumentsError, ListDocumentsRequest, ListDocumentsUseCase,
};
use crate::domain::entities::BookAuthor;
use crate::domain::repositories::BookSortField;
use crate::domain::value_objects::DocumentType;
use crate::presentation::http::dto::{
    ApiResponse, DeleteDocumentResponseDto, DocumentAuthorDto, DocumentAuthorsResponseDto,
    DocumentListResponseDto, DocumentQueryDto, SetDocumentAuthorsDto,
};

pub struct DocumentHandler {
    list_documents_use_case: Arc<ListDocumentsUseCase>,
    document_authors_use_case: Arc<DocumentAuthorsUseCase>,
    delete_document_use_case: Arc<DeleteDocumentUseCase>,
}

/// Turns the raw query string into a listing request, rejecting unknown
/// document types, sort fields, and orders.
pub fn list_request_from_query(query: DocumentQueryDto) -> Result<ListDocumentsRequest, String> {
    let defaults = ListDocumentsRequest::default();

    let document_type = query
        .document_type
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .map(str::parse::<DocumentType>)
        .transpose()?;

    let sort_by = query
        .sort_by
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .map(str::parse::<BookSortField>)
        .transpose()?
        .unwrap_or(defaults.sort_by);

    let descending = match query.order.as_deref().map(|o| o.trim().to_ascii_lowercase()) {
        None => defaults.descending,
        Some(order) => match order.as_str() {
            "" | "asc" => false,
            "desc" => true,
            other => return Err(format!("Unknown sort order: {}", other)),
        },
    };

    Ok(ListDocumentsRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
        search: query.search,
        category: query.category,
        document_type,
        author: query.author,
        sort_by,
        descending,
    })
}

impl DocumentHandler {
    pub fn new(
        list_documents_use_case: Arc<ListDocumentsUseCase>,
        document_authors_use_case: Arc<DocumentAuthorsUseCase>,
        delete_document_use_case: Arc<DeleteDocumentUseCase>,
    ) -> Self {
        Self {
            list_documents_use_case,
            document_authors_use_case,
            delete_document_use_case,
        }
    }

    pub async fn list_documents(
        State(handler): State<Arc<DocumentHandler>>,
        Query(query): Query<DocumentQueryDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = match list_request_from_query(query) {
            Ok(request) => request,
            Err(message) => {
                return Ok((
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error(
                        "INVALID_QUERY".to_string(),
                        message,
                        None,
                    )),
                ));
            }
        };

        match handler.list_documents_use_case.execute(request).await {
            Ok(response) => {
                let dto = DocumentListResponseDto::from(response);
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(ListDocumentsError::ValidationError(message)) => Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    "INVALID_QUERY".to_string(),
                    message,
                    None,
                )),
            )),
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    "FETCH_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
        }
    }

    pub async fn get_document_authors(
        State(handler): State<Arc<DocumentHandler>>,
        Path(filename): Path<String>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let result = handler.document_authors_use_case.get(&filename).await;
        Ok(authors_response(filename, result))
    }

    pub async fn set_document_authors(
        State(handler): State<Arc<DocumentHandler>>,
        Path(filename): Path<String>,
        Json(request): Json<SetDocumentAuthorsDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let result = handler
            .document_authors_use_case
            .set(&filename, request.authors)
            .await;
        Ok(authors_response(filename, result))
    }

    pub async fn delete_document(
        State(handler): State<Arc<DocumentHandler>>,
        Path(filename): Path<String>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.delete_document_use_case.execute(&filename).await {
            Ok(response) => {
                let dto = DeleteDocumentResponseDto::from(response);
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e @ DeleteDocumentError::NotFound(_)) => Ok((
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error(
                    "DOCUMENT_NOT_FOUND".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    "DELETE_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
        }
    }
}

fn authors_response(
    filename: String,
    result: Result<Vec<BookAuthor>, DocumentAuthorsError>,
) -> (StatusCode, Json<ApiResponse<DocumentAuthorsResponseDto>>) {
    match result {
        Ok(authors) => {
            let dto = DocumentAuthorsResponseDto {
                filename,
                authors: authors.into_iter().map(DocumentAuthorDto::from).collect(),
            };
            (StatusCode::OK, Json(ApiResponse::success(dto)))
        }
        Err(e) => {
            let (status, code) = match &e {
                DocumentAuthorsError::NotFound(_) => (StatusCode::NOT_FOUND, "DOCUMENT_NOT_FOUND"),
                DocumentAuthorsError::ValidationError(_) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_FAILED")
                }
                DocumentAuthorsError::RepositoryError(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "AUTHOR_UPDATE_FAILED")
                }
            };
            (
                status,
                Json(ApiResponse::error(code.to_string(), e.to_string(), None)),
            )
        }
    }
}
