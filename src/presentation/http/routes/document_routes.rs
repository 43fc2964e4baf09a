use axum::{
    Router,
    routing::{delete, get},
};
use std::sync::Arc;

use crate::presentation::http::handlers::DocumentHandler;

pub fn document_routes(document_handler: Arc<DocumentHandler>) -> Router {
    Router::new()
        .route("/documents", get(DocumentHandler::list_documents))
        .route(
            "/documents/{filename}/authors",
            get(DocumentHandler::get_document_authors).put(DocumentHandler::set_document_authors),
        )
        .route("/documents/{filename}", delete(DocumentHandler::delete_document))
        .with_state(document_handler)
}
