//! Prometheus metrics recorder and `/metrics` endpoint handler.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Must be called once at server startup before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

/// Record the live room count.
#[allow(clippy::cast_precision_loss)]
pub fn set_rooms_active(count: usize) {
    metrics::gauge!(ROOMS_ACTIVE).set(count as f64);
}

// Metric name constants to avoid typos across modules.

/// WebSocket connections opened total (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket disconnections total (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Active WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// WebSocket connection lifetime in seconds (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
/// Frames dropped on full or closed client queues (counter).
pub const WS_BROADCAST_DROPS_TOTAL: &str = "ws_broadcast_drops_total";
/// Rooms currently alive (gauge).
pub const ROOMS_ACTIVE: &str = "rooms_active";
/// Successful room joins total (counter).
pub const ROOM_JOINS_TOTAL: &str = "room_joins_total";
/// Chat messages broadcast total (counter).
pub const CHAT_MESSAGES_TOTAL: &str = "chat_messages_total";
/// Signaling payloads relayed total (counter, labels: kind).
pub const SIGNALS_RELAYED_TOTAL: &str = "signals_relayed_total";
/// Protocol misuse notices sent total (counter, labels: code).
pub const PROTOCOL_ERRORS_TOTAL: &str = "protocol_errors_total";
