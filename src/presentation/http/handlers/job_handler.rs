use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::use_cases::{GetJobStatusError, GetJobStatusUseCase};
use crate::presentation::http::dto::{ApiResponse, JobStatusDto};

pub struct JobHandler {
    get_job_status_use_case: Arc<GetJobStatusUseCase>,
}

impl JobHandler {
    pub fn new(get_job_status_use_case: Arc<GetJobStatusUseCase>) -> Self {
        Self {
            get_job_status_use_case,
        }
    }

    // Status of one upload job
    pub async fn get_job_status(
        State(handler): State<Arc<JobHandler>>,
        Path(job_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.get_job_status_use_case.execute(job_id).await {
            Ok(response) => {
                let dto = JobStatusDto::from(response);
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e @ GetJobStatusError::JobNotFound(_)) => Ok((
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error(
                    "JOB_NOT_FOUND".to_string(),
                    e.to_string(),
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

    // Jobs still queued or processing
    pub async fn get_active_jobs(
        State(handler): State<Arc<JobHandler>>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.get_job_status_use_case.get_active_jobs().await {
            Ok(jobs) => {
                let dtos: Vec<JobStatusDto> =
                    jobs.into_iter().map(JobStatusDto::from_job).collect();
                Ok((StatusCode::OK, Json(ApiResponse::success(dtos))))
            }
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
}
