use std::sync::Arc;
use tracing::{info, warn};

use crate::application::services::EmbeddingService;
use crate::domain::repositories::{VectorIndex, VectorIndexError};

#[derive(Debug, thiserror::Error)]
pub enum BackfillEmbeddingsError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] VectorIndexError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackfillReport {
    pub scanned: usize,
    pub embedded: usize,
    pub failed: usize,
}

/// Fills in embeddings for chunks stored without one.
pub struct BackfillEmbeddingsUseCase {
    vector_index: Arc<dyn VectorIndex>,
    embedding_service: Arc<EmbeddingService>,
}

impl BackfillEmbeddingsUseCase {
    pub fn new(vector_index: Arc<dyn VectorIndex>, embedding_service: Arc<EmbeddingService>) -> Self {
        Self {
            vector_index,
            embedding_service,
        }
    }

    /// Makes one pass over the backlog in id order, `batch_size` chunks at a
    /// time. Chunks that still cannot be embedded are left NULL and skipped,
    /// so a later call retries them.
    pub async fn execute(&self, batch_size: i64) -> Result<BackfillReport, BackfillEmbeddingsError> {
        if !(1..=1000).contains(&batch_size) {
            return Err(BackfillEmbeddingsError::ValidationError(
                "Batch size must be between 1 and 1000".to_string(),
            ));
        }

        let mut report = BackfillReport::default();
        let mut cursor = 0;
        loop {
            let mut chunks = self
                .vector_index
                .chunks_missing_embeddings(cursor, batch_size)
                .await?;
            let Some(last_id) = chunks.iter().filter_map(|c| c.id()).max() else {
                break;
            };
            cursor = last_id;
            report.scanned += chunks.len();

            let outcome = self.embedding_service.embed_chunks(&mut chunks).await;
            for chunk in &chunks {
                if let (Some(id), Some(embedding)) = (chunk.id(), chunk.embedding()) {
                    self.vector_index.set_embedding(id, embedding).await?;
                }
            }
            report.embedded += outcome.embedded;
            report.failed += outcome.missing;
        }

        if report.failed > 0 {
            warn!("Embedding backfill left {} chunks without an embedding", report.failed);
        }
        info!(
            "Embedding backfill: {} scanned, {} embedded, {} failed",
            report.scanned, report.embedded, report.failed
        );
        Ok(report)
    }
}
