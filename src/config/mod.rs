//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `LIVE_RELAY__` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use live_relay::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod error;
mod server;
mod upstream;

pub use error::{ConfigError, ValidationError};
pub use server::{LogFormat, ServerConfig};
pub use upstream::UpstreamConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every value has a default, so the relay starts with no environment at all.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Listener, logging and client queue settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream live-feed configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `LIVE_RELAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Lets a bare `PORT` variable override the listen port
    ///
    /// # Environment Variable Format
    ///
    /// - `LIVE_RELAY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `LIVE_RELAY__UPSTREAM__ENDPOINT=...` -> `upstream.endpoint = ...`
    /// - `PORT=8080` -> `server.port = 8080` (an empty `PORT` is ignored)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("LIVE_RELAY")
                    .separator("__"),
            )
            .set_override_option("server.port", bare_port())?
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.upstream.validate()?;
        Ok(())
    }
}

/// The bare `PORT` variable. Unset and blank values are ignored.
fn bare_port() -> Option<String> {
    std::env::var("PORT")
        .ok()
        .filter(|port| !port.trim().is_empty())
}
