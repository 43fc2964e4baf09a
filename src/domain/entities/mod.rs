pub mod author;
pub mod book;
pub mod document_chunk;
pub mod enriched_source;
pub mod processing_job;

pub use author::{Author, AuthorWithCount, BookAuthor};
pub use book::{Book, NewBook};
pub use document_chunk::DocumentChunk;
pub use enriched_source::EnrichedSource;
pub use processing_job::{JobResult, ProcessingJob};
