pub mod connection;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod vector_index;

pub use connection::{DbPool, create_connection_pool, get_connection_from_pool, run_migrations};
pub use repositories::{PostgresAuthorRepository, PostgresBookRepository};
pub use vector_index::{VectorBackend, select_vector_index};
