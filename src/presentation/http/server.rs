use axum::{Router, extract::DefaultBodyLimit};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::infrastructure::messaging::UploadWorker;
use crate::presentation::http::{
    handlers::{
        AdminHandler, AuthorHandler, ChatHandler, DocumentHandler, JobHandler, SearchHandler,
        SseHandler, UploadHandler,
    },
    routes::{
        admin_routes, author_routes, chat_routes, document_routes, health_routes, search_routes,
        upload_routes,
    },
};

/// Every handler the router serves, plus the name of the active vector
/// backend for `/health`.
#[derive(Clone)]
pub struct HttpHandlers {
    pub chat: Arc<ChatHandler>,
    pub search: Arc<SearchHandler>,
    pub documents: Arc<DocumentHandler>,
    pub authors: Arc<AuthorHandler>,
    pub uploads: Arc<UploadHandler>,
    pub jobs: Arc<JobHandler>,
    pub sse: Arc<SseHandler>,
    pub admin: Arc<AdminHandler>,
    pub vector_backend: &'static str,
}

pub fn build_router(handlers: &HttpHandlers, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health_routes(handlers.vector_backend))
        .merge(chat_routes(handlers.chat.clone()))
        .merge(search_routes(handlers.search.clone()))
        .merge(document_routes(handlers.documents.clone()))
        .merge(author_routes(handlers.authors.clone()))
        .merge(upload_routes(
            handlers.uploads.clone(),
            handlers.jobs.clone(),
            handlers.sse.clone(),
        ))
        .merge(admin_routes(handlers.admin.clone()))
        .layer(cors)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(
            TraceLayer::new_for_http()
                .on_request(
                    |request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {
                        tracing::info!("Received request: {} {}", request.method(), request.uri());
                    },
                )
                .on_response(
                    |response: &axum::http::Response<axum::body::Body>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            "Response: {} (took {} ms)",
                            response.status(),
                            latency.as_millis()
                        );
                    },
                )
                .on_failure(
                    |error: ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::error!(
                            "Request failed: {:?} (took {} ms)",
                            error,
                            latency.as_millis()
                        );
                    },
                ),
        )
}

pub struct HttpServer {
    handlers: HttpHandlers,
    upload_worker: UploadWorker,
    port: u16,
    max_upload_bytes: usize,
}

impl HttpServer {
    pub fn new(
        handlers: HttpHandlers,
        upload_worker: UploadWorker,
        port: u16,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            handlers,
            upload_worker,
            port,
            max_upload_bytes,
        }
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        // Start the upload worker
        let upload_worker = self.upload_worker;
        tokio::spawn(async move {
            upload_worker.start().await;
        });

        let app = build_router(&self.handlers, self.max_upload_bytes);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!(
            "Listening on {} (vector backend: {})",
            addr, self.handlers.vector_backend
        );

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::application::ports::{ExtractedDocument, ExtractedPage};
    use crate::application::services::{
        ChatService, ContextBuilder, ConversationHistory, DocumentProcessorService,
        EmbeddingService, RTSplitter, RetrievalConfig, RetrievalService,
    };
    use crate::application::use_cases::{
        BackfillEmbeddingsUseCase, DeleteDocumentUseCase, DocumentAuthorsUseCase,
        GetJobStatusUseCase, ListDocumentsUseCase, ManageAuthorsUseCase, QueueUploadUseCase,
        SearchContentUseCase, UploadDocumentUseCase,
    };
    use crate::infrastructure::messaging::{
        InMemoryJobRepository, MpscJobQueue, MpscJobQueueReceiver,
    };
    use crate::test_support::{
        FakeChatProvider, FakeEmbeddingProvider, FakeExtractor, InMemoryAuthorRepository,
        InMemoryBookRepository, InMemoryVectorIndex,
    };

    const BOUNDARY: &str = "docchat-test-boundary";

    fn app() -> Router {
        app_with_receiver().0
    }

    /// The router plus the worker end of its upload queue; dropping the
    /// receiver closes the queue.
    fn app_with_receiver() -> (Router, MpscJobQueueReceiver) {
        let vector_index = Arc::new(InMemoryVectorIndex::new());
        let books = Arc::new(InMemoryBookRepository::new());
        let authors = Arc::new(InMemoryAuthorRepository::new());
        let embedding_service = Arc::new(EmbeddingService::new(Arc::new(
            FakeEmbeddingProvider::new(),
        )));
        let extractor = Arc::new(FakeExtractor::new(ExtractedDocument {
            pages: vec![ExtractedPage {
                number: 1,
                text: "Subfiles display records from a physical file.".to_string(),
            }],
            title: Some("Subfile Basics".to_string()),
            author: Some("Jim Buck".to_string()),
            page_count: 1,
        }));

        let processor = Arc::new(DocumentProcessorService::new(
            extractor,
            embedding_service.clone(),
            vector_index.clone(),
            books.clone(),
            authors.clone(),
            RTSplitter::default(),
        ));
        let retrieval = Arc::new(RetrievalService::new(
            embedding_service.clone(),
            vector_index.clone(),
            books.clone(),
            authors.clone(),
            RetrievalConfig::default(),
        ));
        let chat = Arc::new(ChatService::new(
            retrieval.clone(),
            Arc::new(FakeChatProvider::replying("Use a subfile.")),
            Arc::new(ConversationHistory::new(10)),
            ContextBuilder::new(2000),
        ));

        let job_repository = Arc::new(InMemoryJobRepository::new());
        let (job_queue, receiver) = MpscJobQueue::create_pair();
        let job_status = Arc::new(GetJobStatusUseCase::new(job_repository.clone()));

        let handlers = HttpHandlers {
            chat: Arc::new(ChatHandler::new(chat)),
            search: Arc::new(SearchHandler::new(Arc::new(SearchContentUseCase::new(
                retrieval,
            )))),
            documents: Arc::new(DocumentHandler::new(
                Arc::new(ListDocumentsUseCase::new(
                    books.clone(),
                    authors.clone(),
                    vector_index.clone(),
                )),
                Arc::new(DocumentAuthorsUseCase::new(books.clone(), authors.clone())),
                Arc::new(DeleteDocumentUseCase::new(vector_index.clone(), books)),
            )),
            authors: Arc::new(AuthorHandler::new(Arc::new(ManageAuthorsUseCase::new(
                authors,
            )))),
            uploads: Arc::new(UploadHandler::new(
                Arc::new(UploadDocumentUseCase::new(
                    processor.clone(),
                    Duration::from_millis(0),
                )),
                Arc::new(QueueUploadUseCase::new(
                    job_repository,
                    Arc::new(job_queue),
                    processor,
                )),
            )),
            jobs: Arc::new(JobHandler::new(job_status.clone())),
            sse: Arc::new(SseHandler::new(job_status)),
            admin: Arc::new(AdminHandler::new(Arc::new(BackfillEmbeddingsUseCase::new(
                vector_index,
                embedding_service,
            )))),
            vector_backend: "memory",
        };

        (build_router(&handlers, 1024 * 1024), receiver)
    }

    fn multipart_body(filename: &str, data: &[u8], fields: &[(&str, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_vector_backend() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["status"], "healthy");
        assert_eq!(body["data"]["vector_backend"], "memory");
    }

    #[tokio::test]
    async fn test_upload_then_list_documents() {
        let router = app();

        let body = multipart_body(
            "subfiles.pdf",
            b"%PDF-1.4 fake",
            &[("category", "RPG"), ("year", "2004")],
        );
        let response = router
            .clone()
            .oneshot(upload_request("/upload", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["filename"], "subfiles.pdf");
        assert_eq!(body["data"]["title"], "Subfile Basics");

        let response = router
            .oneshot(Request::get("/documents").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["meta"]["total"], 1);
        assert_eq!(body["data"]["documents"][0]["category"], "RPG");
        assert_eq!(body["data"]["documents"][0]["year"], 2004);
    }

    #[tokio::test]
    async fn test_duplicate_upload_conflicts() {
        let router = app();
        let body = multipart_body("dup.pdf", b"%PDF-1.4 fake", &[]);

        let first = router
            .clone()
            .oneshot(upload_request("/upload", body.clone()))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = router
            .oneshot(upload_request("/upload", body))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_pdf() {
        let body = multipart_body("notes.txt", b"plain text", &[]);
        let response = app()
            .oneshot(upload_request("/upload", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_without_file_is_rejected() {
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"category\"\r\n\r\nRPG\r\n--{BOUNDARY}--\r\n"
        )
        .into_bytes();
        let response = app()
            .oneshot(upload_request("/upload", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "NO_FILE_PROVIDED");
    }

    #[tokio::test]
    async fn test_async_upload_returns_job_status_url() {
        let (router, _receiver) = app_with_receiver();
        let body = multipart_body("queued.pdf", b"%PDF-1.4 fake", &[]);

        let response = router
            .clone()
            .oneshot(upload_request("/upload/async", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        let status_url = body["data"]["status_url"].as_str().unwrap().to_string();
        assert!(status_url.starts_with("/upload/status/"));

        let response = router
            .oneshot(Request::get(status_url.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["filename"], "queued.pdf");
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let uri = format!("/upload/status/{}", uuid::Uuid::new_v4());
        let response = app()
            .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_chat_streams_content_then_metadata_then_done() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/chat",
                serde_json::json!({ "message": "How do subfiles work?" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let events: Vec<serde_json::Value> = text
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|data| serde_json::from_str(data.trim_start()).unwrap())
            .collect();

        let kinds: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
        assert_eq!(kinds.first(), Some(&"content"));
        assert_eq!(&kinds[kinds.len() - 2..], &["metadata", "done"]);

        let answer: String = events
            .iter()
            .filter(|e| e["type"] == "content")
            .map(|e| e["delta"].as_str().unwrap())
            .collect();
        assert_eq!(answer, "Use a subfile.");
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_message() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/chat",
                serde_json::json!({ "message": "   " }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let response = app()
            .oneshot(Request::get("/search?q=").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_documents_reject_unknown_order() {
        let response = app()
            .oneshot(
                Request::get("/documents?order=sideways")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_unknown_document_is_not_found() {
        let response = app()
            .oneshot(
                Request::delete("/documents/missing.pdf")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_author_rejects_blank_name() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/authors",
                serde_json::json!({ "name": "  " }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_backfill_with_nothing_missing() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/admin/embeddings/backfill",
                serde_json::json!({ "batch_size": 10 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["embedded"], 0);
    }
}
