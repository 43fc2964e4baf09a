use serde::{Deserialize, Serialize};

use super::book::{Book, title_from_filename};
use super::author::BookAuthor;
use crate::domain::value_objects::DocumentType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAuthor {
    pub name: String,
    pub site_url: Option<String>,
    pub order: i32,
}

impl From<&BookAuthor> for SourceAuthor {
    fn from(author: &BookAuthor) -> Self {
        Self {
            name: author.name.clone(),
            site_url: author.site_url.clone(),
            order: author.author_order,
        }
    }
}

/// A cited document with whatever catalog data exists for it.
///
/// `metadata_found == false` means no `books` row matched the filename; in that
/// case `title` and `author` stay empty and only `display_title` is filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSource {
    pub filename: String,
    pub title: Option<String>,
    pub display_title: String,
    pub author: Option<String>,
    pub authors: Vec<SourceAuthor>,
    pub document_type: Option<DocumentType>,
    pub category: Option<String>,
    pub mc_press_url: Option<String>,
    pub article_url: Option<String>,
    /// Link the chat client shows for this source.
    pub reference_url: Option<String>,
    pub year: Option<i32>,
    pub metadata_found: bool,
    pub best_distance: f32,
    pub pages: Vec<i32>,
}

impl EnrichedSource {
    pub fn without_metadata(filename: &str, best_distance: f32, pages: Vec<i32>) -> Self {
        Self {
            filename: filename.to_string(),
            title: None,
            display_title: title_from_filename(filename),
            author: None,
            authors: Vec::new(),
            document_type: None,
            category: None,
            mc_press_url: None,
            article_url: None,
            reference_url: None,
            year: None,
            metadata_found: false,
            best_distance,
            pages,
        }
    }

    pub fn from_book(
        book: &Book,
        authors: &[BookAuthor],
        best_distance: f32,
        pages: Vec<i32>,
    ) -> Self {
        let mut ordered: Vec<SourceAuthor> = authors.iter().map(SourceAuthor::from).collect();
        ordered.sort_by_key(|a| a.order);

        let author = if ordered.is_empty() {
            book.author.clone()
        } else {
            Some(
                ordered
                    .iter()
                    .map(|a| a.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        };

        Self {
            filename: book.filename.clone(),
            title: Some(book.title.clone()),
            display_title: book.title.clone(),
            author,
            authors: ordered,
            document_type: Some(book.document_type),
            category: book.category.clone(),
            mc_press_url: book.mc_press_url.clone(),
            article_url: book.article_url.clone(),
            reference_url: book.reference_url().map(str::to_string),
            year: book.year,
            metadata_found: true,
            best_distance,
            pages,
        }
    }
}
