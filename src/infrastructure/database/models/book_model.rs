use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::warn;

use crate::domain::entities::{Book, NewBook};
use crate::domain::value_objects::DocumentType;
use crate::infrastructure::database::schema::books;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = books)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BookModel {
    pub id: i32,
    pub filename: String,
    pub title: String,
    pub author: Option<String>,
    pub category: Option<String>,
    pub document_type: String,
    pub mc_press_url: Option<String>,
    pub article_url: Option<String>,
    pub total_pages: Option<i32>,
    pub tags: Vec<String>,
    pub year: Option<i32>,
    pub processed_at: DateTime<Utc>,
}

impl From<BookModel> for Book {
    fn from(model: BookModel) -> Self {
        let document_type = model.document_type.parse().unwrap_or_else(|e| {
            warn!("Book {} has {}; treating it as a book", model.filename, e);
            DocumentType::default()
        });

        Book {
            id: model.id,
            filename: model.filename,
            title: model.title,
            author: model.author,
            category: model.category,
            document_type,
            mc_press_url: model.mc_press_url,
            article_url: model.article_url,
            total_pages: model.total_pages,
            tags: model.tags,
            year: model.year,
            processed_at: model.processed_at,
        }
    }
}

/// Insert and upsert values. `None` clears a column on update.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = books)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewBookModel {
    pub filename: String,
    pub title: String,
    pub author: Option<String>,
    pub category: Option<String>,
    pub document_type: String,
    pub mc_press_url: Option<String>,
    pub article_url: Option<String>,
    pub total_pages: Option<i32>,
    pub tags: Vec<String>,
    pub year: Option<i32>,
    pub processed_at: DateTime<Utc>,
}

impl From<&NewBook> for NewBookModel {
    fn from(book: &NewBook) -> Self {
        Self {
            filename: book.filename.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            category: book.category.clone(),
            document_type: book.document_type.as_str().to_string(),
            mc_press_url: book.mc_press_url.clone(),
            article_url: book.article_url.clone(),
            total_pages: book.total_pages,
            tags: book.tags.clone(),
            year: book.year,
            processed_at: Utc::now(),
        }
    }
}
