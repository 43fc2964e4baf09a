pub mod chat_service;
pub mod code_detector;
pub mod context_builder;
pub mod conversation_history;
pub mod document_processor;
pub mod embedding_service;
pub mod retrieval_service;
pub mod text_splitter;

pub use chat_service::{ChatEvent, ChatService};
pub use context_builder::ContextBuilder;
pub use conversation_history::ConversationHistory;
pub use document_processor::{
    DocumentDetails, DocumentProcessingError, DocumentProcessorService, IngestionSummary,
};
pub use embedding_service::EmbeddingService;
pub use retrieval_service::{RetrievalConfig, RetrievalError, RetrievalService};
pub use text_splitter::RTSplitter;
