use async_trait::async_trait;
use std::str::FromStr;

use crate::domain::entities::{Book, NewBook};
use crate::domain::value_objects::DocumentType;

#[derive(Debug, thiserror::Error)]
pub enum BookRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookSortField {
    #[default]
    Title,
    Year,
    ProcessedAt,
    TotalPages,
}

impl FromStr for BookSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(BookSortField::Title),
            "year" => Ok(BookSortField::Year),
            "processed_at" | "date" => Ok(BookSortField::ProcessedAt),
            "total_pages" | "pages" => Ok(BookSortField::TotalPages),
            other => Err(format!("Unknown sort field: {}", other)),
        }
    }
}

/// Filters and paging for the document catalog listing.
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    /// Case-insensitive substring over title and legacy author.
    pub search: Option<String>,
    pub category: Option<String>,
    pub document_type: Option<DocumentType>,
    /// Case-insensitive substring over linked author names.
    pub author: Option<String>,
    pub sort_by: BookSortField,
    pub descending: bool,
    pub offset: i64,
    pub limit: i64,
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Insert, or update the existing row with the same filename.
    async fn upsert(&self, book: &NewBook) -> Result<Book, BookRepositoryError>;
    async fn find_by_filename(&self, filename: &str) -> Result<Option<Book>, BookRepositoryError>;
    async fn find_by_filenames(&self, filenames: &[String]) -> Result<Vec<Book>, BookRepositoryError>;
    async fn list(&self, query: &BookQuery) -> Result<Vec<Book>, BookRepositoryError>;
    async fn count(&self, query: &BookQuery) -> Result<i64, BookRepositoryError>;
    async fn delete_by_filename(&self, filename: &str) -> Result<bool, BookRepositoryError>;
}
