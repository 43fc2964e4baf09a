use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Integer, Jsonb, Nullable, Text, Timestamptz};
use pgvector::Vector;

use crate::domain::entities::DocumentChunk;
use crate::domain::value_objects::ChunkMetadata;
use crate::infrastructure::database::schema::{documents, json_documents, vector_documents};

/// A `documents` row read without its embedding column.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChunkModel {
    pub id: i64,
    pub filename: String,
    pub content: String,
    pub page_number: Option<i32>,
    pub chunk_index: i32,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<ChunkModel> for DocumentChunk {
    fn from(model: ChunkModel) -> Self {
        DocumentChunk::from_database(
            model.id,
            model.filename,
            model.content,
            model.page_number,
            model.chunk_index,
            None,
            model
                .metadata
                .as_ref()
                .map(ChunkMetadata::from_json)
                .unwrap_or_default(),
            model.created_at,
        )
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = vector_documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewVectorChunkModel {
    pub filename: String,
    pub content: String,
    pub page_number: Option<i32>,
    pub chunk_index: i32,
    pub embedding: Option<Vector>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<&DocumentChunk> for NewVectorChunkModel {
    fn from(chunk: &DocumentChunk) -> Self {
        Self {
            filename: chunk.filename().to_string(),
            content: chunk.content().to_string(),
            page_number: chunk.page_number(),
            chunk_index: chunk.chunk_index(),
            embedding: chunk.embedding().map(|e| Vector::from(e.to_vec())),
            metadata: Some(chunk.metadata().to_json()),
            created_at: chunk.created_at(),
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = json_documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewJsonChunkModel {
    pub filename: String,
    pub content: String,
    pub page_number: Option<i32>,
    pub chunk_index: i32,
    pub embedding: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<&DocumentChunk> for NewJsonChunkModel {
    fn from(chunk: &DocumentChunk) -> Self {
        Self {
            filename: chunk.filename().to_string(),
            content: chunk.content().to_string(),
            page_number: chunk.page_number(),
            chunk_index: chunk.chunk_index(),
            embedding: chunk.embedding().map(|e| serde_json::json!(e)),
            metadata: Some(chunk.metadata().to_json()),
            created_at: chunk.created_at(),
        }
    }
}

/// A `documents` row of the jsonb backend, embedding included.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = json_documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JsonChunkModel {
    pub id: i64,
    pub filename: String,
    pub content: String,
    pub page_number: Option<i32>,
    pub chunk_index: i32,
    pub embedding: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl JsonChunkModel {
    pub fn into_chunk(self) -> (DocumentChunk, Option<serde_json::Value>) {
        let embedding = self.embedding;
        let chunk = ChunkModel {
            id: self.id,
            filename: self.filename,
            content: self.content,
            page_number: self.page_number,
            chunk_index: self.chunk_index,
            metadata: self.metadata,
            created_at: self.created_at,
        };
        (chunk.into(), embedding)
    }
}

/// Row shape of the raw distance queries.
#[derive(Debug, QueryableByName)]
pub struct ScoredChunkRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub filename: String,
    #[diesel(sql_type = Text)]
    pub content: String,
    #[diesel(sql_type = Nullable<Integer>)]
    pub page_number: Option<i32>,
    #[diesel(sql_type = Integer)]
    pub chunk_index: i32,
    #[diesel(sql_type = Nullable<Jsonb>)]
    pub metadata: Option<serde_json::Value>,
    #[diesel(sql_type = Timestamptz)]
    pub created_at: DateTime<Utc>,
    #[diesel(sql_type = Double)]
    pub distance: f64,
}

impl ScoredChunkRow {
    pub fn into_parts(self) -> (DocumentChunk, f32) {
        let distance = self.distance as f32;
        let chunk = ChunkModel {
            id: self.id,
            filename: self.filename,
            content: self.content,
            page_number: self.page_number,
            chunk_index: self.chunk_index,
            metadata: self.metadata,
            created_at: self.created_at,
        };
        (chunk.into(), distance)
    }
}

/// Parses a jsonb embedding array.
pub fn embedding_from_json(value: serde_json::Value) -> Result<Vec<f32>, serde_json::Error> {
    serde_json::from_value(value)
}
