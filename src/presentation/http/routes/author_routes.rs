use axum::{
    Router,
    routing::{get, patch, post},
};
use std::sync::Arc;

use crate::presentation::http::handlers::AuthorHandler;

pub fn author_routes(author_handler: Arc<AuthorHandler>) -> Router {
    Router::new()
        .route("/authors/search", get(AuthorHandler::search_authors))
        .route("/authors", post(AuthorHandler::create_author))
        .route("/authors/{author_id}", patch(AuthorHandler::update_author))
        .with_state(author_handler)
}
