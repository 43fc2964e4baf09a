use std::sync::Arc;
use tracing::info;

use crate::domain::entities::author::normalize_author_name;
use crate::domain::entities::{Book, BookAuthor, NewBook};
use crate::domain::repositories::{
    AuthorRepository, AuthorRepositoryError, BookRepository, BookRepositoryError,
};
use crate::domain::value_objects::join_authors;

#[derive(Debug, thiserror::Error)]
pub enum DocumentAuthorsError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<BookRepositoryError> for DocumentAuthorsError {
    fn from(error: BookRepositoryError) -> Self {
        DocumentAuthorsError::RepositoryError(error.to_string())
    }
}

impl From<AuthorRepositoryError> for DocumentAuthorsError {
    fn from(error: AuthorRepositoryError) -> Self {
        DocumentAuthorsError::RepositoryError(error.to_string())
    }
}

/// Reads and rewrites the ordered author list of one document.
pub struct DocumentAuthorsUseCase {
    book_repository: Arc<dyn BookRepository>,
    author_repository: Arc<dyn AuthorRepository>,
}

impl DocumentAuthorsUseCase {
    pub fn new(
        book_repository: Arc<dyn BookRepository>,
        author_repository: Arc<dyn AuthorRepository>,
    ) -> Self {
        Self {
            book_repository,
            author_repository,
        }
    }

    pub async fn get(&self, filename: &str) -> Result<Vec<BookAuthor>, DocumentAuthorsError> {
        let book = self.find_book(filename).await?;
        let mut authors = self.author_repository.authors_for_books(&[book.id]).await?;
        Ok(authors.remove(&book.id).unwrap_or_default())
    }

    /// Replaces the list; positions are renumbered 0..n in the given order.
    /// Repeated names keep their first position.
    pub async fn set(
        &self,
        filename: &str,
        names: Vec<String>,
    ) -> Result<Vec<BookAuthor>, DocumentAuthorsError> {
        let mut normalized: Vec<String> = Vec::with_capacity(names.len());
        for name in names.iter().filter_map(|n| normalize_author_name(n)) {
            if !normalized.contains(&name) {
                normalized.push(name);
            }
        }
        if normalized.is_empty() {
            return Err(DocumentAuthorsError::ValidationError(
                "A document needs at least one author".to_string(),
            ));
        }

        let book = self.find_book(filename).await?;

        let mut authors = Vec::with_capacity(normalized.len());
        for name in &normalized {
            authors.push(self.author_repository.get_or_create(name).await?);
        }
        let ids: Vec<i32> = authors.iter().map(|a| a.id).collect();
        self.author_repository
            .replace_book_authors(book.id, &ids)
            .await?;

        // Keep the legacy single-string column in step with the links
        self.book_repository
            .upsert(&NewBook {
                author: join_authors(&normalized),
                ..new_book_from(&book)
            })
            .await?;

        info!("Set {} authors on {}", authors.len(), filename);
        Ok(authors
            .iter()
            .enumerate()
            .map(|(order, author)| BookAuthor::from_author(author, order as i32))
            .collect())
    }

    async fn find_book(&self, filename: &str) -> Result<Book, DocumentAuthorsError> {
        self.book_repository
            .find_by_filename(filename)
            .await?
            .ok_or_else(|| DocumentAuthorsError::NotFound(filename.to_string()))
    }
}

fn new_book_from(book: &Book) -> NewBook {
    NewBook {
        filename: book.filename.clone(),
        title: book.title.clone(),
        author: book.author.clone(),
        category: book.category.clone(),
        document_type: book.document_type,
        mc_press_url: book.mc_press_url.clone(),
        article_url: book.article_url.clone(),
        total_pages: book.total_pages,
        tags: book.tags.clone(),
        year: book.year,
    }
}
