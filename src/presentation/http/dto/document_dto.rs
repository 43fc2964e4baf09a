use serde::{Deserialize, Serialize};

use crate::application::use_cases::{
    DeleteDocumentResponse, DocumentSummary, ListDocumentsResponse,
};
use crate::domain::entities::BookAuthor;
use crate::presentation::http::dto::PaginationMetaDto;

#[derive(Debug, Deserialize, Default)]
pub struct DocumentQueryDto {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub document_type: Option<String>,
    pub author: Option<String>,
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub order: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentAuthorDto {
    pub id: i32,
    pub name: String,
    pub site_url: Option<String>,
    pub order: i32,
}

impl From<BookAuthor> for DocumentAuthorDto {
    fn from(author: BookAuthor) -> Self {
        Self {
            id: author.author_id,
            name: author.name,
            site_url: author.site_url,
            order: author.author_order,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentDto {
    pub id: i32,
    pub filename: String,
    pub title: String,
    pub author: Option<String>,
    pub authors: Vec<DocumentAuthorDto>,
    pub category: Option<String>,
    pub document_type: String,
    pub mc_press_url: Option<String>,
    pub article_url: Option<String>,
    pub total_pages: Option<i32>,
    pub tags: Vec<String>,
    pub year: Option<i32>,
    pub processed_at: String,
    pub chunk_count: i64,
}

impl From<DocumentSummary> for DocumentDto {
    fn from(summary: DocumentSummary) -> Self {
        let book = summary.book;
        Self {
            id: book.id,
            filename: book.filename,
            title: book.title,
            author: book.author,
            authors: summary
                .authors
                .into_iter()
                .map(DocumentAuthorDto::from)
                .collect(),
            category: book.category,
            document_type: book.document_type.as_str().to_string(),
            mc_press_url: book.mc_press_url,
            article_url: book.article_url,
            total_pages: book.total_pages,
            tags: book.tags,
            year: book.year,
            processed_at: book.processed_at.to_rfc3339(),
            chunk_count: summary.chunk_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentListResponseDto {
    pub documents: Vec<DocumentDto>,
    pub meta: PaginationMetaDto,
}

impl From<ListDocumentsResponse> for DocumentListResponseDto {
    fn from(response: ListDocumentsResponse) -> Self {
        Self {
            documents: response
                .documents
                .into_iter()
                .map(DocumentDto::from)
                .collect(),
            meta: PaginationMetaDto {
                page: response.page,
                per_page: response.per_page,
                total: response.total,
                total_pages: response.total_pages,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetDocumentAuthorsDto {
    pub authors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentAuthorsResponseDto {
    pub filename: String,
    pub authors: Vec<DocumentAuthorDto>,
}

#[derive(Debug, Serialize)]
pub struct DeleteDocumentResponseDto {
    pub filename: String,
    pub chunks_deleted: usize,
    pub book_deleted: bool,
}

impl From<DeleteDocumentResponse> for DeleteDocumentResponseDto {
    fn from(response: DeleteDocumentResponse) -> Self {
        Self {
            filename: response.filename,
            chunks_deleted: response.chunks_deleted,
            book_deleted: response.book_deleted,
        }
    }
}
