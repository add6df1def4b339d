//! Server configuration.

use std::time::Duration;

use huddle_settings::HuddleSettings;
use serde::{Deserialize, Serialize};

/// Configuration for the relay server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,
    /// Interval between server-initiated Ping frames, in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// Disconnect a client that has not answered a ping for this long,
    /// in milliseconds.
    pub client_timeout_ms: u64,
    /// Max inbound WebSocket message size in bytes.
    pub max_message_bytes: usize,
    /// Outbound frame queue depth per client.
    pub send_queue_depth: usize,
    /// Chat messages retained per room (`0` disables the cap).
    pub history_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_connections: 1024,
            heartbeat_interval_ms: 30_000,
            client_timeout_ms: 75_000,
            max_message_bytes: 64 * 1024,
            send_queue_depth: 1024,
            history_limit: 200,
        }
    }
}

impl ServerConfig {
    /// Build a config from loaded settings.
    #[must_use]
    pub fn from_settings(settings: &HuddleSettings) -> Self {
        Self {
            host: settings.server.host.clone(),
            port: settings.server.port,
            max_connections: settings.server.max_connections,
            heartbeat_interval_ms: settings.server.heartbeat_interval_ms,
            client_timeout_ms: settings.server.client_timeout_ms,
            max_message_bytes: settings.server.max_message_bytes,
            send_queue_depth: settings.server.send_queue_depth,
            history_limit: settings.rooms.history_limit,
        }
    }

    /// Ping cadence as a [`Duration`].
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Pong cutoff as a [`Duration`].
    #[must_use]
    pub fn client_timeout(&self) -> Duration {
        Duration::from_millis(self.client_timeout_ms)
    }
}
