use std::sync::Arc;

use crate::domain::entities::author::normalize_author_name;
use crate::domain::entities::{Author, AuthorWithCount};
use crate::domain::repositories::{AuthorRepository, AuthorRepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum ManageAuthorsError {
    #[error("Author not found: {0}")]
    NotFound(i32),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<AuthorRepositoryError> for ManageAuthorsError {
    fn from(error: AuthorRepositoryError) -> Self {
        ManageAuthorsError::RepositoryError(error.to_string())
    }
}

pub struct ManageAuthorsUseCase {
    author_repository: Arc<dyn AuthorRepository>,
}

impl ManageAuthorsUseCase {
    pub fn new(author_repository: Arc<dyn AuthorRepository>) -> Self {
        Self { author_repository }
    }

    pub async fn search(
        &self,
        query: &str,
        limit: Option<i64>,
    ) -> Result<Vec<AuthorWithCount>, ManageAuthorsError> {
        let limit = limit.unwrap_or(10);
        if !(1..=100).contains(&limit) {
            return Err(ManageAuthorsError::ValidationError(
                "Limit must be between 1 and 100".to_string(),
            ));
        }
        Ok(self.author_repository.search(query.trim(), limit).await?)
    }

    pub async fn get_or_create(&self, name: &str) -> Result<Author, ManageAuthorsError> {
        let name = normalize_author_name(name).ok_or_else(|| {
            ManageAuthorsError::ValidationError("Author name cannot be empty".to_string())
        })?;
        Ok(self.author_repository.get_or_create(&name).await?)
    }

    /// An empty or missing URL clears it.
    pub async fn update_site_url(
        &self,
        author_id: i32,
        site_url: Option<String>,
    ) -> Result<Author, ManageAuthorsError> {
        let site_url = site_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        if let Some(url) = &site_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ManageAuthorsError::ValidationError(format!(
                    "Site URL must start with http:// or https://: {}",
                    url
                )));
            }
        }

        self.author_repository
            .update_site_url(author_id, site_url.as_deref())
            .await?
            .ok_or(ManageAuthorsError::NotFound(author_id))
    }
}
