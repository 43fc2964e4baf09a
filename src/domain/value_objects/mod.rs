pub mod author_names;
pub mod chunk_metadata;
pub mod code_language;
pub mod document_type;
pub mod processing_status;
pub mod vector_math;

pub use author_names::{join_authors, parse_authors};
pub use chunk_metadata::{ChunkKind, ChunkMetadata};
pub use code_language::CodeLanguage;
pub use document_type::DocumentType;
pub use processing_status::ProcessingStatus;
pub use vector_math::cosine_distance;
