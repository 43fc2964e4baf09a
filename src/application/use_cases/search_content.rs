use std::sync::Arc;

use crate::application::services::{RetrievalError, RetrievalService};
use crate::domain::entities::EnrichedSource;
use crate::domain::repositories::ChunkHit;

#[derive(Debug, thiserror::Error)]
pub enum SearchContentError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<RetrievalError> for SearchContentError {
    fn from(error: RetrievalError) -> Self {
        match error {
            RetrievalError::EmptyQuery => SearchContentError::ValidationError(error.to_string()),
            RetrievalError::StorageError(e) => SearchContentError::RepositoryError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchContentRequest {
    pub query: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct SearchContentResponse {
    pub query: String,
    pub chunks: Vec<ChunkHit>,
    pub sources: Vec<EnrichedSource>,
    pub used_full_text: bool,
    pub search_time_ms: u64,
}

/// Raw retrieval without an LLM call.
pub struct SearchContentUseCase {
    retrieval_service: Arc<RetrievalService>,
}

impl SearchContentUseCase {
    pub fn new(retrieval_service: Arc<RetrievalService>) -> Self {
        Self { retrieval_service }
    }

    pub async fn execute(
        &self,
        request: SearchContentRequest,
    ) -> Result<SearchContentResponse, SearchContentError> {
        let start_time = std::time::Instant::now();

        if request.query.trim().is_empty() {
            return Err(SearchContentError::ValidationError(
                "Query cannot be empty".to_string(),
            ));
        }

        let limit = request
            .limit
            .unwrap_or(self.retrieval_service.config().top_n);
        if !(1..=100).contains(&limit) {
            return Err(SearchContentError::ValidationError(
                "Limit must be between 1 and 100".to_string(),
            ));
        }

        let result = self
            .retrieval_service
            .retrieve_with_limit(&request.query, limit)
            .await?;

        Ok(SearchContentResponse {
            query: request.query,
            chunks: result.chunks,
            sources: result.sources,
            used_full_text: result.used_full_text,
            search_time_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}
