use axum::{Router, routing::post};
use std::sync::Arc;

use crate::presentation::http::handlers::AdminHandler;

pub fn admin_routes(admin_handler: Arc<AdminHandler>) -> Router {
    Router::new()
        .route(
            "/admin/embeddings/backfill",
            post(AdminHandler::backfill_embeddings),
        )
        .with_state(admin_handler)
}
