use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::entities::{Author, AuthorWithCount, BookAuthor};

#[derive(Debug, thiserror::Error)]
pub enum AuthorRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Returns the author with this exact name, creating it if absent.
    async fn get_or_create(&self, name: &str) -> Result<Author, AuthorRepositoryError>;
    async fn find_by_id(&self, author_id: i32) -> Result<Option<Author>, AuthorRepositoryError>;
    async fn search(
        &self,
        name_fragment: &str,
        limit: i64,
    ) -> Result<Vec<AuthorWithCount>, AuthorRepositoryError>;
    async fn update_site_url(
        &self,
        author_id: i32,
        site_url: Option<&str>,
    ) -> Result<Option<Author>, AuthorRepositoryError>;
    /// Ordered author lists keyed by book id.
    async fn authors_for_books(
        &self,
        book_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<BookAuthor>>, AuthorRepositoryError>;
    /// Replaces every association of the book; `author_ids` order becomes 0..n.
    async fn replace_book_authors(
        &self,
        book_id: i32,
        author_ids: &[i32],
    ) -> Result<(), AuthorRepositoryError>;
}
