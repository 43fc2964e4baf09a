use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::presentation::http::handlers::{JobHandler, SseHandler, UploadHandler};

pub fn upload_routes(
    upload_handler: Arc<UploadHandler>,
    job_handler: Arc<JobHandler>,
    sse_handler: Arc<SseHandler>,
) -> Router {
    Router::new()
        .route("/upload", post(UploadHandler::upload))
        .route("/upload/async", post(UploadHandler::upload_async))
        .with_state(upload_handler)
        .merge(
            Router::new()
                .route("/upload/status/{job_id}", get(JobHandler::get_job_status))
                .route("/upload/jobs/active", get(JobHandler::get_active_jobs))
                .with_state(job_handler),
        )
        .merge(
            Router::new()
                .route(
                    "/upload/status/{job_id}/stream",
                    get(SseHandler::job_progress_stream),
                )
                .route("/upload/jobs/stream", get(SseHandler::active_jobs_stream))
                .with_state(sse_handler),
        )
}
