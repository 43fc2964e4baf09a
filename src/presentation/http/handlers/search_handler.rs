use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::application::use_cases::{
    SearchContentError, SearchContentRequest, SearchContentUseCase,
};
use crate::presentation::http::dto::{ApiResponse, SearchRequestDto, SearchResponseDto};

pub struct SearchHandler {
    search_use_case: Arc<SearchContentUseCase>,
}

impl SearchHandler {
    pub fn new(search_use_case: Arc<SearchContentUseCase>) -> Self {
        Self { search_use_case }
    }

    pub async fn search_get(
        State(handler): State<Arc<SearchHandler>>,
        Query(params): Query<SearchRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        Ok(Self::run_search(&handler, params).await)
    }

    pub async fn search_post(
        State(handler): State<Arc<SearchHandler>>,
        Json(request): Json<SearchRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        Ok(Self::run_search(&handler, request).await)
    }

    async fn run_search(
        handler: &SearchHandler,
        request: SearchRequestDto,
    ) -> (StatusCode, Json<ApiResponse<SearchResponseDto>>) {
        let request = SearchContentRequest {
            query: request.q,
            limit: request.limit,
        };

        match handler.search_use_case.execute(request).await {
            Ok(response) => (
                StatusCode::OK,
                Json(ApiResponse::success(SearchResponseDto::from(response))),
            ),
            Err(e @ SearchContentError::ValidationError(_)) => (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    "INVALID_SEARCH".to_string(),
                    e.to_string(),
                    None,
                )),
            ),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    "SEARCH_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            ),
        }
    }
}
