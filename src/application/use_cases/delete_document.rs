use std::sync::Arc;
use tracing::info;

use crate::domain::repositories::{BookRepository, BookRepositoryError, VectorIndex, VectorIndexError};

#[derive(Debug, thiserror::Error)]
pub enum DeleteDocumentError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<BookRepositoryError> for DeleteDocumentError {
    fn from(error: BookRepositoryError) -> Self {
        DeleteDocumentError::RepositoryError(error.to_string())
    }
}

impl From<VectorIndexError> for DeleteDocumentError {
    fn from(error: VectorIndexError) -> Self {
        DeleteDocumentError::RepositoryError(error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteDocumentResponse {
    pub filename: String,
    pub chunks_deleted: usize,
    pub book_deleted: bool,
}

/// Removes a document's chunks and its catalog row; author links go with
/// the row through the cascading foreign key.
pub struct DeleteDocumentUseCase {
    vector_index: Arc<dyn VectorIndex>,
    book_repository: Arc<dyn BookRepository>,
}

impl DeleteDocumentUseCase {
    pub fn new(vector_index: Arc<dyn VectorIndex>, book_repository: Arc<dyn BookRepository>) -> Self {
        Self {
            vector_index,
            book_repository,
        }
    }

    pub async fn execute(&self, filename: &str) -> Result<DeleteDocumentResponse, DeleteDocumentError> {
        let chunks_deleted = self.vector_index.delete_by_filename(filename).await?;
        let book_deleted = self.book_repository.delete_by_filename(filename).await?;

        if chunks_deleted == 0 && !book_deleted {
            return Err(DeleteDocumentError::NotFound(filename.to_string()));
        }

        info!(
            "Deleted {}: {} chunks, catalog entry {}",
            filename,
            chunks_deleted,
            if book_deleted { "removed" } else { "absent" }
        );

        Ok(DeleteDocumentResponse {
            filename: filename.to_string(),
            chunks_deleted,
            book_deleted,
        })
    }
}
