pub mod author_model;
pub mod book_model;
pub mod chunk_model;

pub use author_model::*;
pub use book_model::*;
pub use chunk_model::*;
