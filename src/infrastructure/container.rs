use std::sync::Arc;
use tracing::info;

use crate::{
    application::{
        ports::{
            ChatCompletionProvider, DocumentExtractor, EmbeddingProvider, JobQueue,
        },
        services::{
            ChatService, ContextBuilder, ConversationHistory, DocumentProcessorService,
            EmbeddingService, RTSplitter, RetrievalConfig, RetrievalService,
        },
        use_cases::{
            BackfillEmbeddingsUseCase, DeleteDocumentUseCase, DocumentAuthorsUseCase,
            GetJobStatusUseCase, ListDocumentsUseCase, ManageAuthorsUseCase, QueueUploadUseCase,
            SearchContentUseCase, UploadDocumentUseCase,
        },
    },
    domain::repositories::{AuthorRepository, BookRepository, JobRepository},
    infrastructure::{
        config::{AppConfig, EmbeddingProviderKind},
        database::{
            PostgresAuthorRepository, PostgresBookRepository, create_connection_pool,
            run_migrations, select_vector_index,
        },
        external_services::{
            ChatClientConfig, EmbeddingsClientConfig, InferenceClient,
            InferenceEmbeddingProvider, OpenAiChatClient, PdfExtractor,
        },
        messaging::{InMemoryJobRepository, MpscJobQueue, UploadWorker},
    },
    presentation::http::{
        HttpHandlers,
        handlers::{
            AdminHandler, AuthorHandler, ChatHandler, DocumentHandler, JobHandler,
            SearchHandler, SseHandler, UploadHandler,
        },
    },
};

/// Turns of prior conversation replayed into each prompt.
const CONVERSATION_TURNS: usize = 10;

pub struct AppContainer {
    pub handlers: HttpHandlers,
    pub upload_worker: UploadWorker,
}

fn build_embedding_provider(
    config: &AppConfig,
) -> Result<Arc<dyn EmbeddingProvider>, Box<dyn std::error::Error>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.embedding_provider {
        EmbeddingProviderKind::Http => {
            let client = InferenceClient::new(EmbeddingsClientConfig::new(
                config.embeddings_service_url.clone(),
            ))
            .map_err(|e| format!("Failed to create embeddings client: {}", e))?;
            Arc::new(InferenceEmbeddingProvider::new(
                client,
                config.embedding_model.clone(),
                config.embedding_dimension,
            ))
        }
        #[cfg(feature = "local-embed")]
        EmbeddingProviderKind::Local => Arc::new(
            crate::infrastructure::external_services::FastEmbedProvider::new()
                .map_err(|e| format!("Failed to load local embedding model: {}", e))?,
        ),
        #[cfg(not(feature = "local-embed"))]
        EmbeddingProviderKind::Local => {
            return Err("EMBEDDING_PROVIDER=local requires building with the local-embed feature"
                .into());
        }
    };

    if provider.embedding_dimension() != config.embedding_dimension {
        return Err(format!(
            "{} produces {}-dimensional vectors but EMBEDDING_DIMENSION is {}",
            provider.model_name(),
            provider.embedding_dimension(),
            config.embedding_dimension
        )
        .into());
    }

    Ok(provider)
}

impl AppContainer {
    pub async fn new(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        // Database and storage
        let db_pool = create_connection_pool(&config.database_url, config.db_pool_size)?;
        run_migrations(&db_pool)?;

        let vector_index = select_vector_index(
            db_pool.clone(),
            config.vector_backend,
            config.embedding_dimension,
        )
        .await?;
        let book_repository: Arc<dyn BookRepository> =
            Arc::new(PostgresBookRepository::new(db_pool.clone()));
        let author_repository: Arc<dyn AuthorRepository> =
            Arc::new(PostgresAuthorRepository::new(db_pool));
        let job_repository: Arc<dyn JobRepository> = Arc::new(
            InMemoryJobRepository::new()
                .with_retention(chrono::Duration::minutes(config.job_retention_minutes)),
        );

        // External services
        let embedding_provider = build_embedding_provider(config)?;
        let document_extractor: Arc<dyn DocumentExtractor> = Arc::new(PdfExtractor::new());
        let chat_provider: Arc<dyn ChatCompletionProvider> = Arc::new(
            OpenAiChatClient::new(ChatClientConfig {
                api_url: config.llm_api_url.clone(),
                api_key: config.openai_api_key.clone(),
                model: config.openai_model.clone(),
                temperature: config.llm_temperature,
                timeout_secs: 120,
            })
            .map_err(|e| format!("Failed to create chat client: {}", e))?,
        );

        // Application services
        let embedding_service = Arc::new(EmbeddingService::new(embedding_provider));
        let document_processor = Arc::new(DocumentProcessorService::new(
            document_extractor,
            embedding_service.clone(),
            vector_index.clone(),
            book_repository.clone(),
            author_repository.clone(),
            RTSplitter::new(config.chunk_size, config.chunk_overlap),
        ));
        let retrieval_service = Arc::new(RetrievalService::new(
            embedding_service.clone(),
            vector_index.clone(),
            book_repository.clone(),
            author_repository.clone(),
            RetrievalConfig {
                top_n: config.search_top_n,
                distance_threshold: config.distance_threshold,
                max_sources: config.max_sources,
            },
        ));
        let chat_service = Arc::new(ChatService::new(
            retrieval_service.clone(),
            chat_provider,
            Arc::new(
                ConversationHistory::new(CONVERSATION_TURNS)
                    .with_max_conversations(config.max_conversations),
            ),
            ContextBuilder::new(config.max_context_tokens),
        ));

        // Job queue and upload worker
        let (job_queue, job_receiver) = MpscJobQueue::create_pair();
        let job_queue: Arc<dyn JobQueue> = Arc::new(job_queue);
        let upload_worker = UploadWorker::new(
            Arc::new(job_receiver),
            job_repository.clone(),
            document_processor.clone(),
        )
        .with_batch_delay(config.batch_upload_delay);

        // Use cases
        let upload_document_use_case = Arc::new(UploadDocumentUseCase::new(
            document_processor.clone(),
            config.batch_upload_delay,
        ));
        let queue_upload_use_case = Arc::new(QueueUploadUseCase::new(
            job_repository.clone(),
            job_queue,
            document_processor,
        ));
        let get_job_status_use_case = Arc::new(GetJobStatusUseCase::new(job_repository));
        let list_documents_use_case = Arc::new(ListDocumentsUseCase::new(
            book_repository.clone(),
            author_repository.clone(),
            vector_index.clone(),
        ));
        let document_authors_use_case = Arc::new(DocumentAuthorsUseCase::new(
            book_repository.clone(),
            author_repository.clone(),
        ));
        let delete_document_use_case = Arc::new(DeleteDocumentUseCase::new(
            vector_index.clone(),
            book_repository,
        ));
        let manage_authors_use_case = Arc::new(ManageAuthorsUseCase::new(author_repository));
        let search_content_use_case = Arc::new(SearchContentUseCase::new(retrieval_service));
        let backfill_use_case = Arc::new(BackfillEmbeddingsUseCase::new(
            vector_index.clone(),
            embedding_service,
        ));

        // HTTP handlers
        let handlers = HttpHandlers {
            chat: Arc::new(ChatHandler::new(chat_service)),
            search: Arc::new(SearchHandler::new(search_content_use_case)),
            documents: Arc::new(DocumentHandler::new(
                list_documents_use_case,
                document_authors_use_case,
                delete_document_use_case,
            )),
            authors: Arc::new(AuthorHandler::new(manage_authors_use_case)),
            uploads: Arc::new(UploadHandler::new(
                upload_document_use_case,
                queue_upload_use_case,
            )),
            jobs: Arc::new(JobHandler::new(get_job_status_use_case.clone())),
            sse: Arc::new(SseHandler::new(get_job_status_use_case)),
            admin: Arc::new(AdminHandler::new(backfill_use_case)),
            vector_backend: vector_index.backend_name(),
        };

        info!(
            "Container ready: {} vector backend, {}-dim embeddings, chunk size {} / overlap {}",
            vector_index.backend_name(),
            config.embedding_dimension,
            config.chunk_size,
            config.chunk_overlap
        );

        Ok(Self {
            handlers,
            upload_worker,
        })
    }
}
