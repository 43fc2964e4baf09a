use async_trait::async_trait;
use reqwest::{Client, Error as ReqwestError, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingProvider, EmbeddingProviderError,
    EmbeddingRequest, EmbeddingResponse,
};

#[derive(Serialize)]
pub struct EmbeddingsRequest {
    pub text: TextInput,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextInput {
    Single(String),
    Multiple(Vec<String>),
}

#[derive(Deserialize)]
pub struct EmbeddingsResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    pub embeddings: Vec<Vec<f32>>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct EmbeddingsClientConfig {
    pub service_url: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub backoff_factor: f64,
    /// Wait before the first retry; later waits grow by `backoff_factor`.
    pub initial_backoff: Duration,
}

impl EmbeddingsClientConfig {
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            max_retries: 3,
            timeout_secs: 30,
            backoff_factor: 1.5,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingsError {
    #[error("Request failed: {0}")]
    RequestError(String),
    #[error("Embedding service returned {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },
    #[error("Unreadable embedding response: {0}")]
    ParseError(String),
}

impl EmbeddingsError {
    /// Client errors are not retried; the same payload would fail again.
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingsError::RequestError(_) => true,
            EmbeddingsError::HttpStatus { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            EmbeddingsError::ParseError(_) => false,
        }
    }
}

impl From<EmbeddingsError> for EmbeddingProviderError {
    fn from(error: EmbeddingsError) -> Self {
        match error {
            EmbeddingsError::RequestError(msg) => EmbeddingProviderError::NetworkError(msg),
            EmbeddingsError::HttpStatus { status, body }
                if status == StatusCode::SERVICE_UNAVAILABLE =>
            {
                EmbeddingProviderError::ServiceUnavailable(body)
            }
            EmbeddingsError::HttpStatus { status, body } => {
                EmbeddingProviderError::ApiError(format!("{}: {}", status, body))
            }
            EmbeddingsError::ParseError(msg) => EmbeddingProviderError::ApiError(msg),
        }
    }
}

/// HTTP client for the sentence-embedding service.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: Client,
    config: EmbeddingsClientConfig,
}

impl InferenceClient {
    pub fn new(config: EmbeddingsClientConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub async fn get_embedding(&self, text: &str) -> Result<EmbeddingsResponse, EmbeddingsError> {
        let request = EmbeddingsRequest {
            text: TextInput::Single(text.to_string()),
        };

        self.send_request(request).await
    }

    pub async fn get_embeddings(
        &self,
        texts: &[String],
    ) -> Result<EmbeddingsResponse, EmbeddingsError> {
        let request = EmbeddingsRequest {
            text: TextInput::Multiple(texts.to_vec()),
        };

        self.send_request(request).await
    }

    async fn send_request(
        &self,
        request: EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, EmbeddingsError> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.execute_request(&request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempts <= self.config.max_retries => {
                    let backoff_time = self
                        .config
                        .initial_backoff
                        .mul_f64(self.config.backoff_factor.powi(attempts as i32 - 1));
                    warn!(
                        "Embedding request failed (attempt {}): {}; retrying in {:?}",
                        attempts, e, backoff_time
                    );
                    tokio::time::sleep(backoff_time).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn execute_request(
        &self,
        request: &EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, EmbeddingsError> {
        let response = self
            .client
            .post(&self.config.service_url)
            .json(request)
            .send()
            .await
            .map_err(|e| EmbeddingsError::RequestError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingsError::HttpStatus { status, body });
        }

        let response_data = response
            .json::<EmbeddingsResponse>()
            .await
            .map_err(|e| EmbeddingsError::ParseError(e.to_string()))?;

        if !response_data.success {
            return Err(EmbeddingsError::ParseError(
                "service reported success=false".to_string(),
            ));
        }

        debug!("Received {} embeddings", response_data.embeddings.len());
        Ok(response_data)
    }
}

/// `EmbeddingProvider` backed by the remote embedding service.
pub struct InferenceEmbeddingProvider {
    client: InferenceClient,
    model_name: String,
    dimension: usize,
}

impl InferenceEmbeddingProvider {
    pub fn new(client: InferenceClient, model_name: impl Into<String>, dimension: usize) -> Self {
        Self {
            client,
            model_name: model_name.into(),
            dimension,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for InferenceEmbeddingProvider {
    async fn generate_embedding(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        let response = self.client.get_embedding(&request.text).await?;

        let embedding = response.embeddings.into_iter().next().ok_or_else(|| {
            EmbeddingProviderError::ApiError("No embeddings returned".to_string())
        })?;

        Ok(EmbeddingResponse {
            embedding,
            model_name: self.model_name.clone(),
        })
    }

    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        if request.texts.is_empty() {
            return Ok(BatchEmbeddingResponse {
                embeddings: Vec::new(),
                model_name: self.model_name.clone(),
            });
        }

        let response = self.client.get_embeddings(&request.texts).await?;

        if response.embeddings.len() != request.texts.len() {
            return Err(EmbeddingProviderError::ApiError(format!(
                "Expected {} embeddings, got {}",
                request.texts.len(),
                response.embeddings.len()
            )));
        }

        Ok(BatchEmbeddingResponse {
            embeddings: response.embeddings,
            model_name: self.model_name.clone(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer, max_retries: u32) -> InferenceEmbeddingProvider {
        let mut config = EmbeddingsClientConfig::new(format!("{}/embed", server.uri()));
        config.max_retries = max_retries;
        config.initial_backoff = Duration::from_millis(5);
        let client = InferenceClient::new(config).unwrap();
        InferenceEmbeddingProvider::new(client, "all-MiniLM-L6-v2", 3)
    }

    #[test]
    fn test_request_construction() {
        let single = serde_json::to_value(EmbeddingsRequest {
            text: TextInput::Single("Hello world".to_string()),
        })
        .unwrap();
        assert_eq!(single, json!({"text": "Hello world"}));

        let multiple = serde_json::to_value(EmbeddingsRequest {
            text: TextInput::Multiple(vec!["Hello".to_string(), "World".to_string()]),
        })
        .unwrap();
        assert_eq!(multiple, json!({"text": ["Hello", "World"]}));
    }

    #[tokio::test]
    async fn test_batch_embeddings() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .and(body_json(json!({"text": ["first", "second"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "embeddings": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]],
                "shape": [2, 3]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, 0);
        let response = provider
            .generate_embeddings(BatchEmbeddingRequest {
                texts: vec!["first".to_string(), "second".to_string()],
            })
            .await
            .unwrap();

        assert_eq!(response.embeddings.len(), 2);
        assert_eq!(response.embeddings[1], vec![0.4, 0.5, 0.6]);
        assert_eq!(response.model_name, "all-MiniLM-L6-v2");
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("warming up"))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [[1.0, 0.0, 0.0]]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server, 3);
        let response = provider
            .generate_embedding(EmbeddingRequest {
                text: "subfile".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.embedding, vec![1.0, 0.0, 0.0]);
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("text too long"))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, 3);
        let err = provider
            .generate_embedding(EmbeddingRequest {
                text: "x".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, EmbeddingProviderError::ApiError(msg) if msg.contains("text too long")));
    }

    #[tokio::test]
    async fn test_count_mismatch_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "embeddings": [[0.1, 0.2, 0.3]]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server, 0);
        let result = provider
            .generate_embeddings(BatchEmbeddingRequest {
                texts: vec!["a".to_string(), "b".to_string()],
            })
            .await;

        assert!(matches!(result, Err(EmbeddingProviderError::ApiError(_))));
    }
}
