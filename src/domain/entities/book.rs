use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::DocumentType;

/// Catalog record for one ingested file, keyed by filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i32,
    pub filename: String,
    pub title: String,
    /// Legacy single-string author; the ordered list lives in `document_authors`.
    pub author: Option<String>,
    pub category: Option<String>,
    pub document_type: DocumentType,
    pub mc_press_url: Option<String>,
    pub article_url: Option<String>,
    pub total_pages: Option<i32>,
    pub tags: Vec<String>,
    pub year: Option<i32>,
    pub processed_at: DateTime<Utc>,
}

impl Book {
    /// Purchase link for books, article link for articles.
    pub fn reference_url(&self) -> Option<&str> {
        match self.document_type {
            DocumentType::Book => self.mc_press_url.as_deref(),
            DocumentType::Article => self
                .article_url
                .as_deref()
                .or(self.mc_press_url.as_deref()),
        }
    }
}

/// Values written when a document is ingested or its catalog entry is edited.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewBook {
    pub filename: String,
    pub title: String,
    pub author: Option<String>,
    pub category: Option<String>,
    pub document_type: DocumentType,
    pub mc_press_url: Option<String>,
    pub article_url: Option<String>,
    pub total_pages: Option<i32>,
    pub tags: Vec<String>,
    pub year: Option<i32>,
}

/// Title derived from a filename when no catalog entry exists:
/// directory and extension stripped, `_`/`-` turned into spaces.
pub fn title_from_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let stem = match base.rfind('.') {
        Some(dot) if dot > 0 => &base[..dot],
        _ => base,
    };

    let spaced: String = stem
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();
    let title = spaced.split_whitespace().collect::<Vec<_>>().join(" ");

    if title.is_empty() {
        filename.to_string()
    } else {
        title
    }
}
