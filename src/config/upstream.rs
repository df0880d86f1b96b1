//! Upstream live-feed configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Connection settings for the live event feed.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base WebSocket URL of the webcast bridge
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Upper bound on a single connect attempt, in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Ask the bridge to replay events from before the connect
    #[serde(default)]
    pub process_initial_data: bool,

    /// Send a `connected` message to the requester once the room is joined
    #[serde(default)]
    pub announce_connected: bool,
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validate upstream configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let endpoint = self.endpoint.trim();
        let has_host = endpoint
            .strip_prefix("ws://")
            .or_else(|| endpoint.strip_prefix("wss://"))
            .is_some_and(|rest| !rest.is_empty());
        if !has_host {
            return Err(ValidationError::InvalidEndpoint);
        }
        if !(1..=120).contains(&self.connect_timeout_secs) {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            connect_timeout_secs: default_connect_timeout(),
            process_initial_data: false,
            announce_connected: false,
        }
    }
}

fn default_endpoint() -> String {
    "ws://127.0.0.1:8081/live".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}
