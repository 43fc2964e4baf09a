pub mod postgres_author_repository;
pub mod postgres_book_repository;

pub use postgres_author_repository::PostgresAuthorRepository;
pub use postgres_book_repository::PostgresBookRepository;
