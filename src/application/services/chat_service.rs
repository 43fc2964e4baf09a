use async_stream::stream;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::application::ports::{ChatCompletionProvider, ChatMessage};
use crate::application::services::context_builder::{BuiltContext, ContextBuilder};
use crate::application::services::conversation_history::ConversationHistory;
use crate::application::services::retrieval_service::RetrievalService;
use crate::domain::entities::EnrichedSource;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a technical assistant for IBM i developers. \
Answer using the provided document excerpts. Cite the source title and page for the facts you use. \
Reproduce code exactly as it appears in the excerpts. \
If the excerpts do not contain the answer, say so instead of guessing.";

/// One server-sent event of a chat answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    Content {
        delta: String,
    },
    Metadata {
        conversation_id: String,
        chunk_count: usize,
        backend: String,
    },
    Done {
        sources: Vec<EnrichedSource>,
    },
    Error {
        message: String,
    },
}

pub struct ChatService {
    retrieval_service: Arc<RetrievalService>,
    chat_provider: Arc<dyn ChatCompletionProvider>,
    history: Arc<ConversationHistory>,
    context_builder: ContextBuilder,
    system_prompt: String,
}

impl ChatService {
    pub fn new(
        retrieval_service: Arc<RetrievalService>,
        chat_provider: Arc<dyn ChatCompletionProvider>,
        history: Arc<ConversationHistory>,
        context_builder: ContextBuilder,
    ) -> Self {
        Self {
            retrieval_service,
            chat_provider,
            history,
            context_builder,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Streams `content` deltas, then `metadata`, then `done` with the cited
    /// sources. Any failure ends the stream with a single `error` event.
    pub fn stream_answer(
        self: Arc<Self>,
        message: String,
        conversation_id: Option<String>,
    ) -> BoxStream<'static, ChatEvent> {
        let conversation_id = conversation_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let events = stream! {
            let retrieval = match self.retrieval_service.retrieve(&message).await {
                Ok(retrieval) => retrieval,
                Err(e) => {
                    error!("Retrieval failed for conversation {}: {}", conversation_id, e);
                    yield ChatEvent::Error { message: e.to_string() };
                    return;
                }
            };

            let context = self.context_builder.build(&retrieval.chunks, &retrieval.sources);
            let prior = self.history.messages(&conversation_id).await;
            let prompt = self.build_prompt(prior, &context, &message);

            let mut completion = match self.chat_provider.stream_completion(prompt).await {
                Ok(completion) => completion,
                Err(e) => {
                    error!("Completion request failed: {}", e);
                    yield ChatEvent::Error { message: e.to_string() };
                    return;
                }
            };

            let mut answer = String::new();
            while let Some(delta) = completion.next().await {
                match delta {
                    Ok(delta) => {
                        if delta.is_empty() {
                            continue;
                        }
                        answer.push_str(&delta);
                        yield ChatEvent::Content { delta };
                    }
                    Err(e) => {
                        error!("Completion stream failed: {}", e);
                        yield ChatEvent::Error { message: e.to_string() };
                        return;
                    }
                }
            }

            self.history.record(&conversation_id, &message, &answer).await;
            info!(
                "Answered conversation {} from {} chunks of {} sources",
                conversation_id,
                context.chunk_count,
                retrieval.sources.len()
            );

            yield ChatEvent::Metadata {
                conversation_id: conversation_id.clone(),
                chunk_count: context.chunk_count,
                backend: self.retrieval_service.backend_name().to_string(),
            };
            yield ChatEvent::Done { sources: retrieval.sources };
        };

        Box::pin(events)
    }

    fn build_prompt(
        &self,
        prior: Vec<ChatMessage>,
        context: &BuiltContext,
        question: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(prior.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend(prior);

        let user_turn = if context.chunk_count == 0 {
            format!(
                "No document excerpts matched this question.\n\nQuestion: {}",
                question
            )
        } else {
            format!(
                "Document excerpts:\n\n{}\n\nQuestion: {}",
                context.text, question
            )
        };
        messages.push(ChatMessage::user(user_turn));
        messages
    }
}
