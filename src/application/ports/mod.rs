pub mod chat_provider;
pub mod document_extractor;
pub mod embedding_provider;
pub mod job_queue;

pub use chat_provider::{ChatCompletionProvider, ChatMessage, ChatProviderError, ChatRole};
pub use document_extractor::{DocumentExtractionError, DocumentExtractor, ExtractedDocument, ExtractedPage};
pub use embedding_provider::{EmbeddingProvider, EmbeddingProviderError};
pub use job_queue::{JobQueue, JobQueueError, UploadTask};
