use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ChunkKind, ChunkMetadata, CodeLanguage};

/// One retrievable unit of a document: a slice of prose or a detected code block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    id: Option<i64>,
    filename: String,
    content: String,
    page_number: Option<i32>,
    chunk_index: i32,
    embedding: Option<Vec<f32>>,
    metadata: ChunkMetadata,
    created_at: DateTime<Utc>,
}

impl DocumentChunk {
    pub fn new(
        filename: String,
        content: String,
        page_number: Option<i32>,
        chunk_index: i32,
        metadata: ChunkMetadata,
    ) -> Self {
        Self {
            id: None,
            filename,
            content,
            page_number,
            chunk_index,
            embedding: None,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Rebuild a stored chunk (for repository reconstruction)
    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: i64,
        filename: String,
        content: String,
        page_number: Option<i32>,
        chunk_index: i32,
        embedding: Option<Vec<f32>>,
        metadata: ChunkMetadata,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            filename,
            content,
            page_number,
            chunk_index,
            embedding,
            metadata,
            created_at,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn page_number(&self) -> Option<i32> {
        self.page_number
    }

    pub fn chunk_index(&self) -> i32 {
        self.chunk_index
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    pub fn metadata(&self) -> &ChunkMetadata {
        &self.metadata
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn set_embedding(&mut self, embedding: Vec<f32>) {
        self.embedding = Some(embedding);
    }

    pub fn clear_embedding(&mut self) {
        self.embedding = None;
    }

    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }

    pub fn is_code(&self) -> bool {
        self.metadata.chunk_type == ChunkKind::Code
    }

    pub fn language(&self) -> Option<CodeLanguage> {
        self.metadata.language
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn character_count(&self) -> usize {
        self.content.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chunk_has_no_id_or_embedding() {
        let chunk = DocumentChunk::new(
            "guide.pdf".to_string(),
            "Subfiles are loaded page at a time.".to_string(),
            Some(4),
            0,
            ChunkMetadata::text("Subfiles are loaded page at a time.", Some(10)),
        );

        assert_eq!(chunk.id(), None);
        assert!(!chunk.has_embedding());
        assert!(!chunk.is_code());
        assert_eq!(chunk.page_number(), Some(4));
    }

    #[test]
    fn test_code_chunk_language() {
        let mut chunk = DocumentChunk::new(
            "guide.pdf".to_string(),
            "     A          R SFLREC   SFL".to_string(),
            Some(7),
            3,
            ChunkMetadata::code(CodeLanguage::Dds, "     A          R SFLREC   SFL", None),
        );

        assert!(chunk.is_code());
        assert_eq!(chunk.language(), Some(CodeLanguage::Dds));

        chunk.set_embedding(vec![0.1, 0.2]);
        assert!(chunk.has_embedding());
        chunk.clear_embedding();
        assert!(!chunk.has_embedding());
    }
}
