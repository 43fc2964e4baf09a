pub mod document_extractors;
#[cfg(feature = "local-embed")]
pub mod fastembed_provider;
pub mod inference_client;
pub mod openai_chat_client;

pub use document_extractors::PdfExtractor;
#[cfg(feature = "local-embed")]
pub use fastembed_provider::FastEmbedProvider;
pub use inference_client::{EmbeddingsClientConfig, InferenceClient, InferenceEmbeddingProvider};
pub use openai_chat_client::{ChatClientConfig, OpenAiChatClient};
