//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the JSON
//! file format. Each type implements [`Default`] with production default
//! values. Types marked with `#[serde(default)]` allow partial JSON:
//! missing fields get their default value during deserialization.

use serde::{Deserialize, Serialize};

/// Root settings type for the huddle relay.
///
/// Loaded from `~/.huddle/settings.json` with defaults applied for
/// missing fields. Environment variables can override specific values.
///
/// # JSON Format
///
/// All field names are camelCase. Example:
///
/// ```json
/// {
///   "version": "0.1.0",
///   "server": { "port": 8080 },
///   "rooms": { "historyLimit": 500 }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HuddleSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// Gateway network settings.
    pub server: ServerSettings,
    /// Room behavior settings.
    pub rooms: RoomSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for HuddleSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "huddle".to_string(),
            server: ServerSettings::default(),
            rooms: RoomSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Gateway network settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// HTTP/WebSocket port.
    pub port: u16,
    /// Maximum number of concurrent WebSocket connections. New upgrades
    /// beyond this are refused with 503.
    pub max_connections: usize,
    /// WebSocket ping interval in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// Close a connection whose last pong is older than this.
    pub client_timeout_ms: u64,
    /// Maximum accepted WebSocket message size in bytes.
    pub max_message_bytes: usize,
    /// Per-connection outbound queue depth. A full queue drops frames
    /// for that recipient only.
    pub send_queue_depth: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_connections: 1024,
            heartbeat_interval_ms: 30_000,
            client_timeout_ms: 75_000,
            max_message_bytes: 65_536,
            send_queue_depth: 1024,
        }
    }
}

/// Room behavior settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomSettings {
    /// Retained chat messages per room, oldest evicted first.
    /// `0` disables the cap.
    pub history_limit: usize,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self { history_limit: 200 }
    }
}

/// Log level for the stderr subscriber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace-level (most verbose).
    Trace,
    /// Debug-level.
    Debug,
    /// Info-level (default).
    #[default]
    Info,
    /// Warning-level.
    Warn,
    /// Error-level (least verbose).
    Error,
}

impl LogLevel {
    /// Convert to a tracing filter string.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is unset.
    pub level: LogLevel,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
