pub mod author_repository;
pub mod book_repository;
pub mod job_repository;
pub mod vector_index;

pub use author_repository::{AuthorRepository, AuthorRepositoryError};
pub use book_repository::{BookQuery, BookRepository, BookRepositoryError, BookSortField};
pub use job_repository::{JobRepository, JobRepositoryError};
pub use vector_index::{ChunkHit, MatchKind, VectorIndex, VectorIndexError, sort_hits};
