use serde::{Deserialize, Serialize};

use crate::domain::entities::{Author, AuthorWithCount};

#[derive(Debug, Deserialize)]
pub struct AuthorSearchQueryDto {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAuthorRequestDto {
    pub name: String,
}

/// `site_url: null` or an empty string clears the link.
#[derive(Debug, Deserialize)]
pub struct UpdateAuthorRequestDto {
    pub site_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthorDto {
    pub id: i32,
    pub name: String,
    pub site_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_count: Option<i64>,
}

impl From<Author> for AuthorDto {
    fn from(author: Author) -> Self {
        Self {
            id: author.id,
            name: author.name,
            site_url: author.site_url,
            document_count: None,
        }
    }
}

impl From<AuthorWithCount> for AuthorDto {
    fn from(entry: AuthorWithCount) -> Self {
        Self {
            document_count: Some(entry.document_count),
            ..AuthorDto::from(entry.author)
        }
    }
}
