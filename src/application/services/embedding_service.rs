use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, EmbeddingProvider, EmbeddingProviderError, EmbeddingRequest,
};
use crate::domain::entities::DocumentChunk;

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingServiceError {
    #[error("Provider error: {0}")]
    ProviderError(#[from] EmbeddingProviderError),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Outcome of embedding a set of chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmbeddingReport {
    pub embedded: usize,
    pub missing: usize,
}

pub struct EmbeddingService {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl EmbeddingService {
    pub fn new(embedding_provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedding_provider,
            batch_size: 32,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn dimension(&self) -> usize {
        self.embedding_provider.embedding_dimension()
    }

    pub fn model_name(&self) -> &str {
        self.embedding_provider.model_name()
    }

    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingServiceError> {
        if text.trim().is_empty() {
            return Err(EmbeddingServiceError::ValidationError(
                "Cannot embed an empty query".to_string(),
            ));
        }

        let response = self
            .embedding_provider
            .generate_embedding(EmbeddingRequest {
                text: text.to_string(),
            })
            .await?;

        self.check_dimension(&response.embedding)?;
        Ok(response.embedding)
    }

    /// Embeds chunks in batches. A failed batch is retried one chunk at a time;
    /// chunks that still fail keep `embedding = None` and are stored without one.
    pub async fn embed_chunks(&self, chunks: &mut [DocumentChunk]) -> EmbeddingReport {
        let mut report = EmbeddingReport::default();

        for batch in chunks.chunks_mut(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content().to_string()).collect();

            match self
                .embedding_provider
                .generate_embeddings(BatchEmbeddingRequest { texts })
                .await
            {
                Ok(response) if response.embeddings.len() == batch.len() => {
                    for (chunk, vector) in batch.iter_mut().zip(response.embeddings) {
                        if self.check_dimension(&vector).is_ok() {
                            chunk.set_embedding(vector);
                            report.embedded += 1;
                        } else {
                            warn!(
                                "Discarding embedding of wrong dimension for {} chunk {}",
                                chunk.filename(),
                                chunk.chunk_index()
                            );
                            report.missing += 1;
                        }
                    }
                    debug!("Embedded batch of {} chunks", batch.len());
                }
                Ok(response) => {
                    warn!(
                        "Batch embedding returned {} vectors for {} texts, retrying individually",
                        response.embeddings.len(),
                        batch.len()
                    );
                    self.embed_individually(batch, &mut report).await;
                }
                Err(e) => {
                    warn!("Batch embedding failed ({}), retrying individually", e);
                    self.embed_individually(batch, &mut report).await;
                }
            }
        }

        report
    }

    async fn embed_individually(&self, batch: &mut [DocumentChunk], report: &mut EmbeddingReport) {
        for chunk in batch.iter_mut() {
            match self.embed_query(chunk.content()).await {
                Ok(vector) => {
                    chunk.set_embedding(vector);
                    report.embedded += 1;
                }
                Err(e) => {
                    warn!(
                        "Storing {} chunk {} without embedding: {}",
                        chunk.filename(),
                        chunk.chunk_index(),
                        e
                    );
                    report.missing += 1;
                }
            }
        }
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), EmbeddingServiceError> {
        let expected = self.dimension();
        if vector.len() != expected {
            return Err(EmbeddingServiceError::ValidationError(format!(
                "Expected {} dimensions, got {}",
                expected,
                vector.len()
            )));
        }
        Ok(())
    }
}
