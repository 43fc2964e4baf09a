pub mod chunk_queries;
pub mod json_index;
pub mod pgvector_index;

pub use json_index::JsonVectorIndex;
pub use pgvector_index::PgVectorIndex;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Text};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::repositories::{VectorIndex, VectorIndexError};
use crate::infrastructure::database::DbPool;
use chunk_queries::{db_error, with_connection};

/// Requested storage for `documents.embedding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VectorBackend {
    #[default]
    Auto,
    PgVector,
    Json,
}

impl FromStr for VectorBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(VectorBackend::Auto),
            "pgvector" | "vector" => Ok(VectorBackend::PgVector),
            "json" | "jsonb" => Ok(VectorBackend::Json),
            other => Err(format!(
                "Unknown vector backend '{}' (expected auto, pgvector or json)",
                other
            )),
        }
    }
}

#[derive(QueryableByName)]
struct ColumnType {
    #[diesel(sql_type = Text)]
    udt_name: String,
}

#[derive(QueryableByName)]
struct ExtensionAvailable {
    #[diesel(sql_type = Bool)]
    available: bool,
}

fn existing_embedding_type(conn: &mut PgConnection) -> Result<Option<String>, VectorIndexError> {
    let row = diesel::sql_query(
        "SELECT udt_name::text AS udt_name FROM information_schema.columns \
         WHERE table_schema = current_schema() AND table_name = 'documents' \
         AND column_name = 'embedding'",
    )
    .get_result::<ColumnType>(conn)
    .optional()
    .map_err(db_error)?;

    Ok(row.map(|r| r.udt_name))
}

/// True once the `vector` extension is installed in this database.
fn enable_pgvector(conn: &mut PgConnection) -> bool {
    let available = diesel::sql_query(
        "SELECT EXISTS (SELECT 1 FROM pg_available_extensions WHERE name = 'vector') AS available",
    )
    .get_result::<ExtensionAvailable>(conn)
    .map(|row| row.available);

    match available {
        Ok(true) => match conn.batch_execute("CREATE EXTENSION IF NOT EXISTS vector") {
            Ok(()) => true,
            Err(e) => {
                warn!("pgvector is available but could not be enabled: {}", e);
                false
            }
        },
        Ok(false) => false,
        Err(e) => {
            warn!("Could not query pg_available_extensions: {}", e);
            false
        }
    }
}

/// Decides the concrete backend. `pgvector_ready` is only consulted when no
/// `documents.embedding` column exists yet.
fn resolve_backend(
    requested: VectorBackend,
    existing_column: Option<&str>,
    pgvector_ready: impl FnOnce() -> bool,
) -> Result<VectorBackend, VectorIndexError> {
    match (existing_column, requested) {
        (Some("vector"), VectorBackend::Json) | (Some("jsonb"), VectorBackend::PgVector) => {
            Err(VectorIndexError::UnsupportedSchema(format!(
                "documents.embedding is {} but {:?} was requested",
                existing_column.unwrap_or_default(),
                requested
            )))
        }
        (Some("vector"), _) => Ok(VectorBackend::PgVector),
        (Some("jsonb"), _) => Ok(VectorBackend::Json),
        (Some(other), _) => Err(VectorIndexError::UnsupportedSchema(other.to_string())),
        (None, VectorBackend::Json) => Ok(VectorBackend::Json),
        (None, VectorBackend::PgVector) => {
            if pgvector_ready() {
                Ok(VectorBackend::PgVector)
            } else {
                Err(VectorIndexError::UnsupportedSchema(
                    "pgvector was requested but the extension is not available".to_string(),
                ))
            }
        }
        (None, VectorBackend::Auto) => {
            if pgvector_ready() {
                Ok(VectorBackend::PgVector)
            } else {
                warn!("pgvector extension unavailable; storing embeddings as jsonb");
                Ok(VectorBackend::Json)
            }
        }
    }
}

/// Picks the backend for this database and makes sure its schema exists.
pub async fn select_vector_index(
    pool: DbPool,
    requested: VectorBackend,
    dimension: usize,
) -> Result<Arc<dyn VectorIndex>, VectorIndexError> {
    let backend = with_connection(&pool, move |conn| {
        let existing = existing_embedding_type(conn)?;
        resolve_backend(requested, existing.as_deref(), || enable_pgvector(conn))
    })
    .await?;

    let index: Arc<dyn VectorIndex> = match backend {
        VectorBackend::Json => Arc::new(JsonVectorIndex::new(pool, dimension)),
        _ => Arc::new(PgVectorIndex::new(pool, dimension)),
    };

    index.ensure_schema().await?;
    info!("Using {} vector backend", index.backend_name());
    Ok(index)
}
