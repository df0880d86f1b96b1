//! Listener, logging and client-facing settings.

use serde::{Deserialize, Deserializer};
use std::net::SocketAddr;

use super::error::ValidationError;

/// Settings for the client-facing side of the relay.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// `tracing` filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Allowed browser origins, given as a comma-separated list. Empty allows any.
    #[serde(default, deserialize_with = "comma_separated")]
    pub cors_origins: Vec<String>,

    /// Undelivered events each client may have queued before new ones are dropped
    #[serde(default = "default_client_queue_capacity")]
    pub client_queue_capacity: usize,
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl ServerConfig {
    /// Address the listener binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ValidationError::InvalidHost(self.host.clone()))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.client_queue_capacity == 0 {
            return Err(ValidationError::InvalidQueueCapacity);
        }
        self.socket_addr().map(|_| ())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            cors_origins: Vec::new(),
            client_queue_capacity: default_client_queue_capacity(),
        }
    }
}

fn comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect())
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info,live_relay=debug".to_string()
}

fn default_client_queue_capacity() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_bind_all_interfaces_on_3000() {
        let config = ServerConfig::default();

        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:3000");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.client_queue_capacity, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn hostname_is_not_a_bind_address() {
        let config = ServerConfig {
            host: "relay.local".to_string(),
            ..Default::default()
        };

        assert_eq!(
            config.socket_addr(),
            Err(ValidationError::InvalidHost("relay.local".to_string()))
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn cors_origins_split_on_commas() {
        let config: ServerConfig = serde_json::from_value(json!({
            "cors_origins": " http://localhost:5173, ,http://localhost:3000,"
        }))
        .unwrap();

        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:5173", "http://localhost:3000"]
        );
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn log_format_is_lowercase() {
        let config: ServerConfig = serde_json::from_value(json!({"log_format": "json"})).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn zero_port_or_queue_is_rejected() {
        let port = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert_eq!(port.validate(), Err(ValidationError::InvalidPort));

        let queue = ServerConfig {
            client_queue_capacity: 0,
            ..Default::default()
        };
        assert_eq!(queue.validate(), Err(ValidationError::InvalidQueueCapacity));
    }
}
