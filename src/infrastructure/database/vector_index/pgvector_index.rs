use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use pgvector::Vector;
use std::collections::HashMap;
use tracing::{debug, info};

use super::chunk_queries::{self, SHARED_INDEX_DDL, db_error, with_connection};
use crate::domain::entities::DocumentChunk;
use crate::domain::repositories::{ChunkHit, MatchKind, VectorIndex, VectorIndexError};
use crate::infrastructure::database::models::{NewVectorChunkModel, ScoredChunkRow};
use crate::infrastructure::database::schema::vector_documents;
use crate::infrastructure::database::DbPool;

const NEAREST_SQL: &str = "\
SELECT id, filename, content, page_number, chunk_index, metadata, created_at, \
(embedding <=> $1)::float8 AS distance \
FROM documents \
WHERE embedding IS NOT NULL \
ORDER BY distance, filename, chunk_index \
LIMIT $2";

/// `documents.embedding` stored as a pgvector `vector(N)` column with an
/// HNSW cosine index.
pub struct PgVectorIndex {
    pool: DbPool,
    dimension: usize,
}

impl PgVectorIndex {
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

#[async_trait]
impl VectorIndex for PgVectorIndex {
    fn backend_name(&self) -> &'static str {
        "pgvector"
    }

    async fn ensure_schema(&self) -> Result<(), VectorIndexError> {
        let ddl = format!(
            "CREATE EXTENSION IF NOT EXISTS vector;
CREATE TABLE IF NOT EXISTS documents (
    id BIGSERIAL PRIMARY KEY,
    filename TEXT NOT NULL,
    content TEXT NOT NULL,
    page_number INTEGER,
    chunk_index INTEGER NOT NULL DEFAULT 0,
    embedding vector({}),
    metadata JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS documents_embedding_hnsw_idx ON documents USING hnsw (embedding vector_cosine_ops);
{}",
            self.dimension, SHARED_INDEX_DDL
        );

        with_connection(&self.pool, move |conn| conn.batch_execute(&ddl).map_err(db_error)).await?;
        info!("documents table ready (pgvector, dimension {})", self.dimension);
        Ok(())
    }

    async fn add_chunks(&self, chunks: &[DocumentChunk]) -> Result<usize, VectorIndexError> {
        if chunks.is_empty() {
            return Ok(0);
        }
        for embedding in chunks.iter().filter_map(|c| c.embedding()) {
            self.check_dimension(embedding)?;
        }

        let models: Vec<NewVectorChunkModel> =
            chunks.iter().map(NewVectorChunkModel::from).collect();
        let inserted = with_connection(&self.pool, move |conn| {
            diesel::insert_into(vector_documents::table)
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
        let query = Vector::from(embedding.to_vec());

        let rows = with_connection(&self.pool, move |conn| {
            diesel::sql_query(NEAREST_SQL)
                .bind::<pgvector::sql_types::Vector, _>(query)
                .bind::<BigInt, _>(limit)
                .load::<ScoredChunkRow>(conn)
                .map_err(db_error)
        })
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let (chunk, distance) = row.into_parts();
                ChunkHit {
                    chunk,
                    distance,
                    match_kind: MatchKind::Vector,
                }
            })
            .collect())
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
        let vector = Vector::from(embedding.to_vec());

        with_connection(&self.pool, move |conn| {
            diesel::update(vector_documents::table.find(chunk_id))
                .set(vector_documents::embedding.eq(Some(vector)))
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
