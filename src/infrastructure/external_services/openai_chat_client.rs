use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Error as ReqwestError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::application::ports::chat_provider::{
    ChatCompletionProvider, ChatMessage, ChatProviderError, CompletionStream,
};

#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    /// Base URL of an OpenAI-compatible API, e.g. `https://api.openai.com/v1`.
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    content: Option<String>,
}

/// One line of a `text/event-stream` completion body.
#[derive(Debug, PartialEq)]
pub enum SseLine {
    Delta(String),
    Done,
    Skip,
}

pub fn parse_sse_line(line: &str) -> Result<SseLine, ChatProviderError> {
    let line = line.trim_end_matches('\r');
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(SseLine::Skip);
    };
    let payload = payload.trim();

    if payload == "[DONE]" {
        return Ok(SseLine::Done);
    }
    if payload.is_empty() {
        return Ok(SseLine::Skip);
    }

    let chunk: CompletionChunk = serde_json::from_str(payload)
        .map_err(|e| ChatProviderError::ParseError(format!("{}: {}", e, payload)))?;

    Ok(chunk
        .choices
        .into_iter()
        .find_map(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map(SseLine::Delta)
        .unwrap_or(SseLine::Skip))
}

/// Streaming client for OpenAI-compatible `/chat/completions`.
pub struct OpenAiChatClient {
    client: Client,
    config: ChatClientConfig,
}

impl OpenAiChatClient {
    pub fn new(config: ChatClientConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatCompletionProvider for OpenAiChatClient {
    async fn stream_completion(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<CompletionStream, ChatProviderError> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages: &messages,
            temperature: self.config.temperature,
            stream: true,
        };

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ChatProviderError::NetworkError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Chat completion rejected with {}: {}", status, message);
            return Err(ChatProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let mut bytes = response.bytes_stream();
        let stream = try_stream! {
            let mut buffer = String::new();

            'read: while let Some(piece) = bytes.next().await {
                let piece = piece.map_err(|e| ChatProviderError::NetworkError(e.to_string()))?;
                buffer.push_str(&String::from_utf8_lossy(&piece));

                while let Some(newline) = buffer.find('\n') {
                    let line: String = buffer.drain(..=newline).collect();
                    match parse_sse_line(&line)? {
                        SseLine::Delta(delta) => yield delta,
                        SseLine::Done => break 'read,
                        SseLine::Skip => {}
                    }
                }
            }

            if let SseLine::Delta(delta) = parse_sse_line(&buffer)? {
                yield delta;
            }
            debug!("Completion stream finished");
        };

        Ok(Box::pin(stream))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiChatClient {
        OpenAiChatClient::new(ChatClientConfig {
            api_url: format!("{}/v1/", server.uri()),
            api_key: Some("sk-test".to_string()),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_parse_sse_line() {
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#).unwrap(),
            SseLine::Delta("Hello".to_string())
        );
        assert_eq!(parse_sse_line("data: [DONE]\r").unwrap(), SseLine::Done);
        assert_eq!(parse_sse_line(": keep-alive").unwrap(), SseLine::Skip);
        assert_eq!(parse_sse_line("").unwrap(), SseLine::Skip);
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap(),
            SseLine::Skip
        );
        assert!(parse_sse_line("data: {broken").is_err());
    }

    #[tokio::test]
    async fn test_stream_completion_yields_deltas_in_order() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"SFLSIZ \"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"sets the subfile size.\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let stream = client
            .stream_completion(vec![ChatMessage::user("What is SFLSIZ?")])
            .await
            .unwrap();
        let deltas: Vec<String> = stream.try_collect().await.unwrap();

        assert_eq!(deltas, vec!["SFLSIZ ", "sets the subfile size."]);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client
            .stream_completion(vec![ChatMessage::user("hi")])
            .await;

        match result {
            Err(ChatProviderError::ApiError { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid api key");
            }
            _ => panic!("expected an API error"),
        }
    }
}
