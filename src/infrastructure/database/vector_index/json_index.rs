use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::chunk_queries::{self, SHARED_INDEX_DDL, db_error, with_connection};
use crate::domain::entities::DocumentChunk;
use crate::domain::repositories::{ChunkHit, MatchKind, VectorIndex, VectorIndexError, sort_hits};
use crate::domain::value_objects::cosine_distance;
use crate::infrastructure::database::models::{
    JsonChunkModel, NewJsonChunkModel, embedding_from_json,
};
use crate::infrastructure::database::schema::json_documents;
use crate::infrastructure::database::DbPool;

const JSON_TABLE_DDL: &str = "\
CREATE TABLE IF NOT EXISTS documents (
    id BIGSERIAL PRIMARY KEY,
    filename TEXT NOT NULL,
    content TEXT NOT NULL,
    page_number INTEGER,
    chunk_index INTEGER NOT NULL DEFAULT 0,
    embedding JSONB,
    metadata JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);";

/// Fallback for servers without the pgvector extension: embeddings are
/// stored as jsonb arrays and ranked in process.
pub struct JsonVectorIndex {
    pool: DbPool,
    dimension: usize,
}

impl JsonVectorIndex {
    pub fn new(pool: DbPool, dimension: usize) -> Self {
        Self { pool, dimension }
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), VectorIndexError> {
        if embedding.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}

/// Scores every candidate against `query`, keeping the `limit` nearest.
/// Rows whose stored vector is unreadable or has the wrong length are skipped.
fn rank_candidates(
    candidates: Vec<(DocumentChunk, Option<serde_json::Value>)>,
    query: &[f32],
    limit: usize,
) -> Vec<ChunkHit> {
    let mut hits: Vec<ChunkHit> = candidates
        .into_iter()
        .filter_map(|(chunk, stored)| {
            let stored = stored?;
            let vector = match embedding_from_json(stored) {
                Ok(vector) => vector,
                Err(e) => {
                    warn!(
                        "Skipping chunk {:?} of {}: unreadable embedding ({})",
                        chunk.id(),
                        chunk.filename(),
                        e
                    );
                    return None;
                }
            };
            let distance = cosine_distance(query, &vector)?;
            Some(ChunkHit {
                chunk,
                distance,
                match_kind: MatchKind::Vector,
            })
        })
        .collect();

    sort_hits(&mut hits);
    hits.truncate(limit);
    hits
}

#[async_trait]
impl VectorIndex for JsonVectorIndex {
    fn backend_name(&self) -> &'static str {
        "json"
    }

    async fn ensure_schema(&self) -> Result<(), VectorIndexError> {
        with_connection(&self.pool, |conn| {
            conn.batch_execute(&format!("{}\n{}", JSON_TABLE_DDL, SHARED_INDEX_DDL))
                .map_err(db_error)
        })
        .await?;
        info!("documents table ready (jsonb embeddings, dimension {})", self.dimension);
        Ok(())
    }

    async fn add_chunks(&self, chunks: &[DocumentChunk]) -> Result<usize, VectorIndexError> {
        if chunks.is_empty() {
            return Ok(0);
        }
        for embedding in chunks.iter().filter_map(|c| c.embedding()) {
            self.check_dimension(embedding)?;
        }

        let models: Vec<NewJsonChunkModel> = chunks.iter().map(NewJsonChunkModel::from).collect();
        let inserted = with_connection(&self.pool, move |conn| {
            diesel::insert_into(json_documents::table)
                .values(&models)
                .execute(conn)
                .map_err(db_error)
        })
        .await?;

        debug!("Stored {} chunks for {}", inserted, chunks[0].filename());
        Ok(inserted)
    }

    async fn search(
        &self,
        embedding: &[f32],
        limit: i64,
    ) -> Result<Vec<ChunkHit>, VectorIndexError> {
        self.check_dimension(embedding)?;
        let query = embedding.to_vec();
        let limit = usize::try_from(limit).unwrap_or(0);

        with_connection(&self.pool, move |conn| {
            let rows = json_documents::table
                .filter(json_documents::embedding.is_not_null())
                .select(JsonChunkModel::as_select())
                .load(conn)
                .map_err(db_error)?;

            let candidates = rows.into_iter().map(JsonChunkModel::into_chunk).collect();
            Ok(rank_candidates(candidates, &query, limit))
        })
        .await
    }

    async fn text_search(&self, query: &str, limit: i64) -> Result<Vec<ChunkHit>, VectorIndexError> {
        let query = query.to_string();
        with_connection(&self.pool, move |conn| {
            chunk_queries::text_search(conn, &query, limit)
        })
        .await
    }

    async fn chunks_missing_embeddings(
        &self,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<DocumentChunk>, VectorIndexError> {
        with_connection(&self.pool, move |conn| {
            chunk_queries::chunks_missing_embeddings(conn, after_id, limit)
        })
        .await
    }

    async fn set_embedding(
        &self,
        chunk_id: i64,
        embedding: &[f32],
    ) -> Result<(), VectorIndexError> {
        self.check_dimension(embedding)?;
        let value = serde_json::json!(embedding);

        with_connection(&self.pool, move |conn| {
            diesel::update(json_documents::table.find(chunk_id))
                .set(json_documents::embedding.eq(Some(value)))
                .execute(conn)
                .map_err(db_error)
        })
        .await?;
        Ok(())
    }

    async fn count_by_filenames(
        &self,
        filenames: &[String],
    ) -> Result<HashMap<String, i64>, VectorIndexError> {
        let filenames = filenames.to_vec();
        with_connection(&self.pool, move |conn| {
            chunk_queries::count_by_filenames(conn, &filenames)
        })
        .await
    }

    async fn has_document(&self, filename: &str) -> Result<bool, VectorIndexError> {
        let filename = filename.to_string();
        with_connection(&self.pool, move |conn| {
            chunk_queries::has_document(conn, &filename)
        })
        .await
    }

    async fn delete_by_filename(&self, filename: &str) -> Result<usize, VectorIndexError> {
        let filename = filename.to_string();
        with_connection(&self.pool, move |conn| {
            chunk_queries::delete_by_filename(conn, &filename)
        })
        .await
    }
}
