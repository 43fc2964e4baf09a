pub mod config;
pub mod container;
pub mod database;
pub mod external_services;
pub mod logging;
pub mod messaging;

pub use config::AppConfig;
pub use container::AppContainer;
pub use logging::init_tracing;
