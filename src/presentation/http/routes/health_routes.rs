use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};

use crate::presentation::http::dto::{ApiResponse, HealthResponseDto};

pub fn health_routes(vector_backend: &'static str) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(move || health_handler(vector_backend)))
}

async fn root_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse::success("docchat".to_string())),
    )
}

async fn health_handler(vector_backend: &'static str) -> impl IntoResponse {
    let health_response = HealthResponseDto {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        vector_backend: vector_backend.to_string(),
    };

    (StatusCode::OK, Json(ApiResponse::success(health_response)))
}
