pub mod admin_handler;
pub mod author_handler;
pub mod chat_handler;
pub mod document_handler;
pub mod job_handler;
pub mod search_handler;
pub mod sse_handler;
pub mod upload_handler;

pub use admin_handler::AdminHandler;
pub use author_handler::AuthorHandler;
pub use chat_handler::ChatHandler;
pub use document_handler::DocumentHandler;
pub use job_handler::JobHandler;
pub use search_handler::SearchHandler;
pub use sse_handler::SseHandler;
pub use upload_handler::UploadHandler;
