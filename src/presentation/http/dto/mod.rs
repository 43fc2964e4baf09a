pub mod author_dto;
pub mod chat_dto;
pub mod document_dto;
pub mod job_dto;
pub mod response_dto;
pub mod search_dto;
pub mod upload_dto;

pub use author_dto::*;
pub use chat_dto::*;
pub use document_dto::*;
pub use job_dto::*;
pub use response_dto::*;
pub use search_dto::*;
pub use upload_dto::*;
