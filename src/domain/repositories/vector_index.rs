use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;

use crate::domain::entities::DocumentChunk;

#[derive(Debug, thiserror::Error)]
pub enum VectorIndexError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Unsupported embedding column type: {0}")]
    UnsupportedSchema(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Vector,
    FullText,
}

/// A stored chunk returned by a search, with its distance to the query.
///
/// For `FullText` hits the distance is `1 - rank`, comparable only among
/// full-text hits.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkHit {
    pub chunk: DocumentChunk,
    pub distance: f32,
    pub match_kind: MatchKind,
}

/// Storage and nearest-neighbour search over the `documents` table.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Short backend name reported by `/health` ("pgvector" or "json").
    fn backend_name(&self) -> &'static str;

    /// Create the `documents` table and its indexes if missing.
    async fn ensure_schema(&self) -> Result<(), VectorIndexError>;

    async fn add_chunks(&self, chunks: &[DocumentChunk]) -> Result<usize, VectorIndexError>;

    /// Nearest chunks by cosine distance, ascending; ties broken by
    /// `(filename, chunk_index)`. Chunks without an embedding are skipped.
    async fn search(&self, embedding: &[f32], limit: i64)
    -> Result<Vec<ChunkHit>, VectorIndexError>;

    /// Postgres full-text ranking over chunk content.
    async fn text_search(&self, query: &str, limit: i64) -> Result<Vec<ChunkHit>, VectorIndexError>;

    /// Chunks stored without an embedding and with an id above `after_id`,
    /// in ascending id order.
    async fn chunks_missing_embeddings(
        &self,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<DocumentChunk>, VectorIndexError>;

    async fn set_embedding(&self, chunk_id: i64, embedding: &[f32])
    -> Result<(), VectorIndexError>;

    async fn count_by_filenames(
        &self,
        filenames: &[String],
    ) -> Result<HashMap<String, i64>, VectorIndexError>;

    async fn has_document(&self, filename: &str) -> Result<bool, VectorIndexError>;

    async fn delete_by_filename(&self, filename: &str) -> Result<usize, VectorIndexError>;
}

/// Orders hits by distance, then filename, then chunk index.
pub fn sort_hits(hits: &mut [ChunkHit]) {
    hits.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.chunk.filename().cmp(b.chunk.filename()))
            .then_with(|| a.chunk.chunk_index().cmp(&b.chunk.chunk_index()))
    });
}
