pub mod admin_routes;
pub mod author_routes;
pub mod chat_routes;
pub mod document_routes;
pub mod health_routes;
pub mod search_routes;
pub mod upload_routes;

pub use admin_routes::*;
pub use author_routes::*;
pub use chat_routes::*;
pub use document_routes::*;
pub use health_routes::*;
pub use search_routes::*;
pub use upload_routes::*;
