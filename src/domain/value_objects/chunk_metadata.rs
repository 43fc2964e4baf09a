use serde::{Deserialize, Serialize};

use super::CodeLanguage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    #[default]
    Text,
    Code,
}

/// Per-chunk metadata persisted in the `documents.metadata` json column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default)]
    pub chunk_type: ChunkKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<CodeLanguage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<i32>,
    #[serde(default)]
    pub char_count: usize,
}

impl ChunkMetadata {
    pub fn text(content: &str, total_pages: Option<i32>) -> Self {
        Self {
            chunk_type: ChunkKind::Text,
            language: None,
            total_pages,
            char_count: content.chars().count(),
        }
    }

    pub fn code(language: CodeLanguage, content: &str, total_pages: Option<i32>) -> Self {
        Self {
            chunk_type: ChunkKind::Code,
            language: Some(language),
            total_pages,
            char_count: content.chars().count(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }

    /// Rows written by older ingestion runs carry arbitrary keys; anything
    /// unreadable falls back to a plain text chunk.
    pub fn from_json(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}
