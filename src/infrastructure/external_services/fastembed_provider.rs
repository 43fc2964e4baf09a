use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;
use tracing::info;

use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingProvider, EmbeddingProviderError,
    EmbeddingRequest, EmbeddingResponse,
};

const MODEL_NAME: &str = "all-MiniLM-L6-v2";
const DIMENSION: usize = 384;

/// In-process all-MiniLM-L6-v2 embeddings. Inference runs on the blocking pool.
pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
}

impl FastEmbedProvider {
    pub fn new() -> Result<Self, EmbeddingProviderError> {
        let model = TextEmbedding::try_new(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
            .map_err(|e| EmbeddingProviderError::ServiceUnavailable(e.to_string()))?;
        info!("Loaded local embedding model {}", MODEL_NAME);

        Ok(Self {
            model: Arc::new(model),
        })
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingProviderError> {
        let model = Arc::clone(&self.model);

        tokio::task::spawn_blocking(move || model.embed(texts, None))
            .await
            .map_err(|e| EmbeddingProviderError::ServiceUnavailable(e.to_string()))?
            .map_err(|e| EmbeddingProviderError::ApiError(e.to_string()))
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn generate_embedding(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        let embedding = self
            .embed(vec![request.text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingProviderError::ApiError("No embedding produced".to_string()))?;

        Ok(EmbeddingResponse {
            embedding,
            model_name: MODEL_NAME.to_string(),
        })
    }

    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        let embeddings = self.embed(request.texts).await?;

        Ok(BatchEmbeddingResponse {
            embeddings,
            model_name: MODEL_NAME.to_string(),
        })
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn embedding_dimension(&self) -> usize {
        DIMENSION
    }
}
