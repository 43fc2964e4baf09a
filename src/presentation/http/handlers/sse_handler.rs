use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response, Sse, sse::Event},
};
use futures::stream::{self, Stream};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio::time::sleep;
use uuid::Uuid;

use crate::application::use_cases::GetJobStatusUseCase;
use crate::presentation::http::dto::JobStatusDto;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct SseHandler {
    get_job_status_use_case: Arc<GetJobStatusUseCase>,
}

impl SseHandler {
    pub fn new(get_job_status_use_case: Arc<GetJobStatusUseCase>) -> Self {
        Self {
            get_job_status_use_case,
        }
    }

    /// Pushes the job's status every second until it finishes or fails.
    pub async fn job_progress_stream(
        State(handler): State<Arc<SseHandler>>,
        Path(job_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let use_case = handler.get_job_status_use_case.clone();

        let stream = stream::unfold(Some(false), move |state| {
            let use_case = use_case.clone();
            async move {
                let Some(polled_before) = state else {
                    return None;
                };
                if polled_before {
                    sleep(POLL_INTERVAL).await;
                }

                match use_case.execute(job_id).await {
                    Ok(response) => {
                        let job_status = JobStatusDto::from(response);
                        let event = Event::default()
                            .event("job_progress")
                            .json_data(&job_status)
                            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));

                        let next = (!job_status.is_terminal).then_some(true);
                        Some((Ok::<_, Infallible>(event), next))
                    }
                    Err(e) => {
                        let error_event = Event::default().event("error").data(e.to_string());
                        Some((Ok::<_, Infallible>(error_event), None))
                    }
                }
            }
        });

        Ok(create_sse_response(stream))
    }

    /// Pushes the list of queued and processing jobs every two seconds.
    pub async fn active_jobs_stream(
        State(handler): State<Arc<SseHandler>>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let use_case = handler.get_job_status_use_case.clone();

        let stream = stream::unfold(false, move |polled_before| {
            let use_case = use_case.clone();
            async move {
                if polled_before {
                    sleep(POLL_INTERVAL * 2).await;
                }

                let event = match use_case.get_active_jobs().await {
                    Ok(jobs) => {
                        let jobs: Vec<JobStatusDto> =
                            jobs.into_iter().map(JobStatusDto::from_job).collect();
                        Event::default()
                            .event("active_jobs")
                            .json_data(&jobs)
                            .unwrap_or_else(|e| {
                                Event::default().event("error").data(e.to_string())
                            })
                    }
                    Err(_) => Event::default()
                        .event("error")
                        .data("Failed to fetch active jobs"),
                };

                Some((Ok::<_, Infallible>(event), true))
            }
        });

        Ok(create_sse_response(stream))
    }
}

pub fn create_sse_response<S>(stream: S) -> Response
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    Sse::new(stream)
        .keep_alive(
            axum::response::sse::KeepAlive::new()
                .interval(Duration::from_secs(30))
                .text("keep-alive"),
        )
        .into_response()
}
