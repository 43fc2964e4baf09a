//! Queries that read the `documents` table without touching the embedding
//! column, shared by both backends.

use diesel::dsl::{count_star, sql};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool, Text};
use std::collections::HashMap;

use crate::domain::entities::DocumentChunk;
use crate::domain::repositories::{ChunkHit, MatchKind, VectorIndexError};
use crate::infrastructure::database::models::{ChunkModel, ScoredChunkRow};
use crate::infrastructure::database::schema::documents;
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

const TEXT_SEARCH_SQL: &str = "\
SELECT id, filename, content, page_number, chunk_index, metadata, created_at, \
(1 - ts_rank_cd(to_tsvector('english', content), plainto_tsquery('english', $1), 32))::float8 AS distance \
FROM documents \
WHERE to_tsvector('english', content) @@ plainto_tsquery('english', $1) \
ORDER BY distance, filename, chunk_index \
LIMIT $2";

/// Index DDL common to both embedding column types.
pub const SHARED_INDEX_DDL: &str = "\
CREATE INDEX IF NOT EXISTS documents_content_fts_idx ON documents USING gin (to_tsvector('english', content));
CREATE INDEX IF NOT EXISTS documents_filename_idx ON documents (filename);";

pub(crate) fn db_error(e: impl std::fmt::Display) -> VectorIndexError {
    VectorIndexError::DatabaseError(e.to_string())
}

/// Checks out a pooled connection and runs `query` on the blocking pool.
pub(crate) async fn with_connection<T, F>(pool: &DbPool, query: F) -> Result<T, VectorIndexError>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> Result<T, VectorIndexError> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = get_connection_from_pool(&pool).map_err(db_error)?;
        query(&mut *conn)
    })
    .await
    .map_err(|e| VectorIndexError::DatabaseError(format!("Task join error: {}", e)))?
}

/// Full-text ranked hits; `ts_rank_cd` normalization 32 keeps rank in [0, 1).
pub fn text_search(
    conn: &mut PgConnection,
    query: &str,
    limit: i64,
) -> Result<Vec<ChunkHit>, VectorIndexError> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }

    let rows = diesel::sql_query(TEXT_SEARCH_SQL)
        .bind::<Text, _>(query)
        .bind::<BigInt, _>(limit)
        .load::<ScoredChunkRow>(conn)
        .map_err(db_error)?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let (chunk, distance) = row.into_parts();
            ChunkHit {
                chunk,
                distance,
                match_kind: MatchKind::FullText,
            }
        })
        .collect())
}

/// Chunks without an embedding whose id is above `after_id`, in id order.
pub fn chunks_missing_embeddings(
    conn: &mut PgConnection,
    after_id: i64,
    limit: i64,
) -> Result<Vec<DocumentChunk>, VectorIndexError> {
    let models = documents::table
        .filter(sql::<Bool>("embedding IS NULL"))
        .filter(documents::id.gt(after_id))
        .order(documents::id.asc())
        .limit(limit)
        .select(ChunkModel::as_select())
        .load(conn)
        .map_err(db_error)?;

    Ok(models.into_iter().map(DocumentChunk::from).collect())
}

pub fn count_by_filenames(
    conn: &mut PgConnection,
    filenames: &[String],
) -> Result<HashMap<String, i64>, VectorIndexError> {
    if filenames.is_empty() {
        return Ok(HashMap::new());
    }

    let counts = documents::table
        .filter(documents::filename.eq_any(filenames))
        .group_by(documents::filename)
        .select((documents::filename, count_star()))
        .load::<(String, i64)>(conn)
        .map_err(db_error)?;

    Ok(counts.into_iter().collect())
}

pub fn has_document(conn: &mut PgConnection, filename: &str) -> Result<bool, VectorIndexError> {
    diesel::select(diesel::dsl::exists(
        documents::table.filter(documents::filename.eq(filename)),
    ))
    .get_result(conn)
    .map_err(db_error)
}

pub fn delete_by_filename(
    conn: &mut PgConnection,
    filename: &str,
) -> Result<usize, VectorIndexError> {
    diesel::delete(documents::table.filter(documents::filename.eq(filename)))
        .execute(conn)
        .map_err(db_error)
}
