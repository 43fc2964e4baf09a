use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i32,
    pub name: String,
    pub site_url: Option<String>,
}

/// An author as linked to one document, with its position in the byline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookAuthor {
    pub author_id: i32,
    pub name: String,
    pub site_url: Option<String>,
    pub author_order: i32,
}

impl BookAuthor {
    pub fn from_author(author: &Author, author_order: i32) -> Self {
        Self {
            author_id: author.id,
            name: author.name.clone(),
            site_url: author.site_url.clone(),
            author_order,
        }
    }
}

/// Search hit for the author picker: the author plus how many documents cite them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorWithCount {
    pub author: Author,
    pub document_count: i64,
}

/// Normalizes an author name for storage and lookup.
pub fn normalize_author_name(name: &str) -> Option<String> {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}
