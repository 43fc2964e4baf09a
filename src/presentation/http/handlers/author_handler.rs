use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::application::use_cases::{ManageAuthorsError, ManageAuthorsUseCase};
use crate::presentation::http::dto::{
    ApiResponse, AuthorDto, AuthorSearchQueryDto, CreateAuthorRequestDto, UpdateAuthorRequestDto,
};

pub struct AuthorHandler {
    manage_authors_use_case: Arc<ManageAuthorsUseCase>,
}

fn error_parts(error: &ManageAuthorsError) -> (StatusCode, &'static str) {
    match error {
        ManageAuthorsError::NotFound(_) => (StatusCode::NOT_FOUND, "AUTHOR_NOT_FOUND"),
        ManageAuthorsError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
        ManageAuthorsError::RepositoryError(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "AUTHOR_STORE_FAILED")
        }
    }
}

impl AuthorHandler {
    pub fn new(manage_authors_use_case: Arc<ManageAuthorsUseCase>) -> Self {
        Self {
            manage_authors_use_case,
        }
    }

    // Name lookup for author pickers, with per-author document counts
    pub async fn search_authors(
        State(handler): State<Arc<AuthorHandler>>,
        Query(query): Query<AuthorSearchQueryDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler
            .manage_authors_use_case
            .search(&query.q, query.limit)
            .await
        {
            Ok(authors) => {
                let dtos: Vec<AuthorDto> = authors.into_iter().map(AuthorDto::from).collect();
                Ok((StatusCode::OK, Json(ApiResponse::success(dtos))))
            }
            Err(e) => {
                let (status, code) = error_parts(&e);
                Ok((
                    status,
                    Json(ApiResponse::error(code.to_string(), e.to_string(), None)),
                ))
            }
        }
    }

    pub async fn create_author(
        State(handler): State<Arc<AuthorHandler>>,
        Json(request): Json<CreateAuthorRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler
            .manage_authors_use_case
            .get_or_create(&request.name)
            .await
        {
            Ok(author) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(AuthorDto::from(author))),
            )),
            Err(e) => {
                let (status, code) = error_parts(&e);
                Ok((
                    status,
                    Json(ApiResponse::error(code.to_string(), e.to_string(), None)),
                ))
            }
        }
    }

    pub async fn update_author(
        State(handler): State<Arc<AuthorHandler>>,
        Path(author_id): Path<i32>,
        Json(request): Json<UpdateAuthorRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler
            .manage_authors_use_case
            .update_site_url(author_id, request.site_url)
            .await
        {
            Ok(author) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(AuthorDto::from(author))),
            )),
            Err(e) => {
                let (status, code) = error_parts(&e);
                Ok((
                    status,
                    Json(ApiResponse::error(code.to_string(), e.to_string(), None)),
                ))
            }
        }
    }
}
