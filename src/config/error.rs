//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidHost(String),

    #[error("Client queue capacity must be at least 1")]
    InvalidQueueCapacity,

    #[error("Upstream endpoint must be a ws:// or wss:// URL")]
    InvalidEndpoint,

    #[error("Upstream connect timeout must be between 1 and 120 seconds")]
    InvalidTimeout,
}
