use std::sync::Arc;

use crate::domain::entities::{Book, BookAuthor};
use crate::domain::repositories::{
    AuthorRepository, AuthorRepositoryError, BookQuery, BookRepository, BookRepositoryError,
    BookSortField, VectorIndex, VectorIndexError,
};
use crate::domain::value_objects::DocumentType;

#[derive(Debug, thiserror::Error)]
pub enum ListDocumentsError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<BookRepositoryError> for ListDocumentsError {
    fn from(error: BookRepositoryError) -> Self {
        ListDocumentsError::RepositoryError(error.to_string())
    }
}

impl From<AuthorRepositoryError> for ListDocumentsError {
    fn from(error: AuthorRepositoryError) -> Self {
        ListDocumentsError::RepositoryError(error.to_string())
    }
}

impl From<VectorIndexError> for ListDocumentsError {
    fn from(error: VectorIndexError) -> Self {
        ListDocumentsError::RepositoryError(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ListDocumentsRequest {
    pub page: i64,
    pub per_page: i64,
    pub search: Option<String>,
    pub category: Option<String>,
    pub document_type: Option<DocumentType>,
    pub author: Option<String>,
    pub sort_by: BookSortField,
    pub descending: bool,
}

impl Default for ListDocumentsRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
            search: None,
            category: None,
            document_type: None,
            author: None,
            sort_by: BookSortField::default(),
            descending: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentSummary {
    pub book: Book,
    pub authors: Vec<BookAuthor>,
    pub chunk_count: i64,
}

#[derive(Debug, Clone)]
pub struct ListDocumentsResponse {
    pub documents: Vec<DocumentSummary>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

pub struct ListDocumentsUseCase {
    book_repository: Arc<dyn BookRepository>,
    author_repository: Arc<dyn AuthorRepository>,
    vector_index: Arc<dyn VectorIndex>,
}

impl ListDocumentsUseCase {
    pub fn new(
        book_repository: Arc<dyn BookRepository>,
        author_repository: Arc<dyn AuthorRepository>,
        vector_index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            book_repository,
            author_repository,
            vector_index,
        }
    }

    pub async fn execute(
        &self,
        request: ListDocumentsRequest,
    ) -> Result<ListDocumentsResponse, ListDocumentsError> {
        if request.page < 1 {
            return Err(ListDocumentsError::ValidationError(
                "Page must be at least 1".to_string(),
            ));
        }
        if !(1..=100).contains(&request.per_page) {
            return Err(ListDocumentsError::ValidationError(
                "per_page must be between 1 and 100".to_string(),
            ));
        }

        let offset = (request.page - 1)
            .checked_mul(request.per_page)
            .ok_or_else(|| {
                ListDocumentsError::ValidationError(format!("Page {} is out of range", request.page))
            })?;

        let query = BookQuery {
            search: non_blank(request.search),
            category: non_blank(request.category),
            document_type: request.document_type,
            author: non_blank(request.author),
            sort_by: request.sort_by,
            descending: request.descending,
            offset,
            limit: request.per_page,
        };

        let books = self.book_repository.list(&query).await?;
        let total = self.book_repository.count(&query).await?;

        let book_ids: Vec<i32> = books.iter().map(|b| b.id).collect();
        let filenames: Vec<String> = books.iter().map(|b| b.filename.clone()).collect();
        let mut authors = if book_ids.is_empty() {
            Default::default()
        } else {
            self.author_repository.authors_for_books(&book_ids).await?
        };
        let counts = if filenames.is_empty() {
            Default::default()
        } else {
            self.vector_index.count_by_filenames(&filenames).await?
        };

        let documents = books
            .into_iter()
            .map(|book| DocumentSummary {
                authors: authors.remove(&book.id).unwrap_or_default(),
                chunk_count: counts.get(&book.filename).copied().unwrap_or(0),
                book,
            })
            .collect();

        Ok(ListDocumentsResponse {
            documents,
            total,
            page: request.page,
            per_page: request.per_page,
            total_pages: (total + request.per_page - 1) / request.per_page,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
