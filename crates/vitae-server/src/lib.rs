//! Vitae Server
//!
//! HTTP front end for the résumé pipeline: accepts PDF and DOCX uploads,
//! runs them through a shared [`ResumeParser`], and answers with a JSON
//! envelope.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::ServerConfig;
use handlers::{create_router, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vitae_extractor::ResumeParser;
use vitae_llm::{CompletionBackend, CompletionPool};

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The pipeline could not be assembled
    #[error("Initialization error: {0}")]
    Init(String),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Install the global tracing subscriber
///
/// Honors `RUST_LOG`, defaulting to `info`. A second call is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Build the completion pool and pipeline described by `config`
pub fn build_parser(config: &ServerConfig) -> Result<Arc<ResumeParser<CompletionBackend>>, ServerError> {
    config.validate()?;

    let backends = config
        .completion
        .backends(config.extractor.context_window_tokens);
    let pool = CompletionPool::new(backends, config.completion.pool.clone())
        .map_err(|e| ServerError::Init(e.to_string()))?;
    let parser = ResumeParser::new(Arc::new(pool), config.extractor.clone())
        .map_err(|e| ServerError::Init(e.to_string()))?;

    Ok(Arc::new(parser))
}

/// Start the HTTP server
///
/// Builds the pipeline, serves until Ctrl-C, then closes the completion
/// pool and lets in-flight requests finish.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    init_tracing();

    info!("Starting Vitae server");
    info!("Bind address: {}", config.bind_addr());
    info!(
        "Backend: {:?}, model '{}'",
        config.completion.backend, config.completion.model
    );
    info!("Upload limit: {} bytes", config.max_upload_bytes);

    let parser = build_parser(&config)?;
    let state = AppState {
        parser: Arc::clone(&parser),
        max_upload_bytes: config.max_upload_bytes,
    };
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested, closing completion pool");
            parser.pool().shutdown();
        })
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_parser_from_test_config() {
        let config = ServerConfig::default_test_config();
        let parser = build_parser(&config).unwrap();
        assert_eq!(parser.pool().size(), 1);
        assert_eq!(parser.pool().model_name(), "mock");
    }

    #[test]
    fn test_build_parser_one_instance_per_endpoint() {
        let mut config = ServerConfig::default_test_config();
        config.completion.endpoints = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let parser = build_parser(&config).unwrap();
        assert_eq!(parser.pool().size(), 3);
    }

    #[test]
    fn test_build_parser_rejects_bad_extractor_config() {
        let mut config = ServerConfig::default_test_config();
        config.extractor.reserved_completion_tokens = config.extractor.context_window_tokens;
        assert!(matches!(build_parser(&config), Err(ServerError::Config(_))));
    }
}
