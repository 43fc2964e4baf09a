use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::infrastructure::database::VectorBackend;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Source of embeddings for ingestion and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProviderKind {
    /// Remote sentence-embedding service at `EMBEDDINGS_SERVICE_URL`.
    Http,
    /// In-process fastembed model; requires the `local-embed` feature.
    Local,
}

impl FromStr for EmbeddingProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" | "remote" => Ok(Self::Http),
            "local" | "fastembed" => Ok(Self::Local),
            other => Err(format!("expected http or local, got '{}'", other)),
        }
    }
}

/// Typed process settings read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub db_pool_size: u32,
    pub vector_backend: VectorBackend,
    pub embedding_dimension: usize,
    pub embedding_provider: EmbeddingProviderKind,
    pub embeddings_service_url: String,
    pub embedding_model: String,
    pub llm_api_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub llm_temperature: f32,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub search_top_n: i64,
    pub distance_threshold: f32,
    pub max_sources: usize,
    pub max_context_tokens: usize,
    pub batch_upload_delay: Duration,
    pub max_upload_bytes: usize,
    pub max_conversations: usize,
    pub job_retention_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let config = Self {
            database_url: get("DATABASE_URL")
                .ok_or_else(|| ConfigError::MissingVariable("DATABASE_URL".to_string()))?,
            port: parse_or(&get, "PORT", 3000)?,
            db_pool_size: parse_or(&get, "DB_POOL_SIZE", 10)?,
            vector_backend: parse_or(&get, "VECTOR_BACKEND", VectorBackend::Auto)?,
            embedding_dimension: parse_or(&get, "EMBEDDING_DIMENSION", 384)?,
            embedding_provider: parse_or(&get, "EMBEDDING_PROVIDER", EmbeddingProviderKind::Http)?,
            embeddings_service_url: get("EMBEDDINGS_SERVICE_URL")
                .unwrap_or_else(|| "http://localhost:8000/embed".to_string()),
            embedding_model: get("EMBEDDING_MODEL")
                .unwrap_or_else(|| "all-MiniLM-L6-v2".to_string()),
            llm_api_url: get("LLM_API_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            llm_temperature: parse_or(&get, "LLM_TEMPERATURE", 0.2)?,
            chunk_size: parse_or(&get, "CHUNK_SIZE", 1000)?,
            chunk_overlap: parse_or(&get, "CHUNK_OVERLAP", 200)?,
            search_top_n: parse_or(&get, "SEARCH_TOP_N", 30)?,
            distance_threshold: parse_or(&get, "DISTANCE_THRESHOLD", 0.55)?,
            max_sources: parse_or(&get, "MAX_SOURCES", 12)?,
            max_context_tokens: parse_or(&get, "MAX_CONTEXT_TOKENS", 6000)?,
            batch_upload_delay: Duration::from_millis(parse_or(
                &get,
                "BATCH_UPLOAD_DELAY_MS",
                1000u64,
            )?),
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", 100 * 1024 * 1024)?,
            max_conversations: parse_or(&get, "MAX_CONVERSATIONS", 1000)?,
            job_retention_minutes: parse_or(&get, "JOB_RETENTION_MINUTES", 60)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };

        if self.chunk_size == 0 {
            return Err(invalid("CHUNK_SIZE", "must be greater than zero"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(invalid("CHUNK_OVERLAP", "must be smaller than CHUNK_SIZE"));
        }
        if self.embedding_dimension == 0 {
            return Err(invalid("EMBEDDING_DIMENSION", "must be greater than zero"));
        }
        if self.db_pool_size == 0 {
            return Err(invalid("DB_POOL_SIZE", "must be greater than zero"));
        }
        if self.search_top_n <= 0 {
            return Err(invalid("SEARCH_TOP_N", "must be greater than zero"));
        }
        if !(0.0..=2.0).contains(&self.distance_threshold) {
            return Err(invalid("DISTANCE_THRESHOLD", "must be between 0 and 2"));
        }
        if self.max_conversations == 0 {
            return Err(invalid("MAX_CONVERSATIONS", "must be greater than zero"));
        }
        if self.job_retention_minutes < 0 {
            return Err(invalid("JOB_RETENTION_MINUTES", "must not be negative"));
        }
        Ok(())
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/docs")]))
                .unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.vector_backend, VectorBackend::Auto);
        assert_eq!(config.embedding_provider, EmbeddingProviderKind::Http);
        assert_eq!(config.embedding_dimension, 384);
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.search_top_n, 30);
        assert!((config.distance_threshold - 0.55).abs() < f32::EPSILON);
        assert_eq!(config.max_sources, 12);
        assert_eq!(config.max_context_tokens, 6000);
        assert_eq!(config.batch_upload_delay, Duration::from_millis(1000));
        assert_eq!(config.max_conversations, 1000);
        assert_eq!(config.job_retention_minutes, 60);
        assert_eq!(config.openai_api_key, None);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/docs"),
            ("PORT", "8080"),
            ("VECTOR_BACKEND", "json"),
            ("EMBEDDING_PROVIDER", "local"),
            ("OPENAI_API_KEY", "sk-live"),
            ("BATCH_UPLOAD_DELAY_MS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.vector_backend, VectorBackend::Json);
        assert_eq!(config.embedding_provider, EmbeddingProviderKind::Local);
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-live"));
        assert_eq!(config.batch_upload_delay, Duration::ZERO);
    }

    #[test]
    fn test_missing_database_url() {
        let result = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")]));
        assert!(matches!(result, Err(ConfigError::MissingVariable(key)) if key == "DATABASE_URL"));
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let result = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/docs"),
            ("SEARCH_TOP_N", "thirty"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { key, .. }) if key == "SEARCH_TOP_N"));

        let result = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/docs"),
            ("CHUNK_SIZE", "100"),
            ("CHUNK_OVERLAP", "100"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { key, .. }) if key == "CHUNK_OVERLAP"));
    }
}
