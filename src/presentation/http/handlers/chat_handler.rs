use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response, sse::Event},
};
use futures::StreamExt;
use std::{convert::Infallible, sync::Arc};

use crate::application::services::{ChatEvent, ChatService};
use crate::presentation::http::dto::{ApiResponse, ChatRequestDto};
use crate::presentation::http::handlers::sse_handler::create_sse_response;

pub struct ChatHandler {
    chat_service: Arc<ChatService>,
}

fn to_sse_event(event: &ChatEvent) -> Event {
    Event::default().json_data(event).unwrap_or_else(|e| {
        Event::default().data(format!(
            r#"{{"type":"error","message":"Failed to encode event: {}"}}"#,
            e
        ))
    })
}

impl ChatHandler {
    pub fn new(chat_service: Arc<ChatService>) -> Self {
        Self { chat_service }
    }

    /// Answers over server-sent events. Every event is a JSON object tagged
    /// with `type`: content deltas, then metadata, then done.
    pub async fn chat(
        State(handler): State<Arc<ChatHandler>>,
        Json(request): Json<ChatRequestDto>,
    ) -> Response {
        if request.message.trim().is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::error(
                    "EMPTY_MESSAGE".to_string(),
                    "Message cannot be empty".to_string(),
                    None,
                )),
            )
                .into_response();
        }

        let events = handler
            .chat_service
            .clone()
            .stream_answer(request.message, request.conversation_id)
            .map(|event| Ok::<_, Infallible>(to_sse_event(&event)));

        create_sse_response(events)
    }
}
