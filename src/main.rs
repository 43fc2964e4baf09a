mod application;
mod domain;
mod infrastructure;
mod presentation;
#[cfg(test)]
mod test_support;

use tracing::info;

use infrastructure::{AppConfig, AppContainer, init_tracing};
use presentation::http::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    info!(
        "Starting docchat on port {} (vector backend: {:?})",
        config.port, config.vector_backend
    );

    let container = AppContainer::new(&config).await?;
    let server = HttpServer::new(
        container.handlers,
        container.upload_worker,
        config.port,
        config.max_upload_bytes,
    );

    server.run().await
}
