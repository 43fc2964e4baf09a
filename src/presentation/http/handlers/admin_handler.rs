use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::application::use_cases::{BackfillEmbeddingsError, BackfillEmbeddingsUseCase};
use crate::presentation::http::dto::{ApiResponse, BackfillRequestDto, BackfillResponseDto};

const DEFAULT_BACKFILL_BATCH: i64 = 100;

pub struct AdminHandler {
    backfill_use_case: Arc<BackfillEmbeddingsUseCase>,
}

impl AdminHandler {
    pub fn new(backfill_use_case: Arc<BackfillEmbeddingsUseCase>) -> Self {
        Self { backfill_use_case }
    }

    // Embeds chunks that were stored while the provider was unavailable
    pub async fn backfill_embeddings(
        State(handler): State<Arc<AdminHandler>>,
        request: Option<Json<BackfillRequestDto>>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let batch_size = request
            .and_then(|Json(body)| body.batch_size)
            .unwrap_or(DEFAULT_BACKFILL_BATCH);

        match handler.backfill_use_case.execute(batch_size).await {
            Ok(report) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(BackfillResponseDto::from(report))),
            )),
            Err(e @ BackfillEmbeddingsError::ValidationError(_)) => Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    "VALIDATION_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    "BACKFILL_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
        }
    }
}
