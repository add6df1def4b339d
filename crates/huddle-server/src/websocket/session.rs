//! Per-connection session loop.
//!
//! Owns the socket for the life of one client: sends the `connected`
//! hello, pumps queued outbound frames, pings on the heartbeat interval,
//! and feeds incoming frames through [`handler`]. The loop ends on client
//! close, socket error, heartbeat timeout, or server shutdown; cleanup
//! always leaves the room exactly once.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use huddle_core::{ConnectionId, ServerEvent};
use huddle_rooms::RoomRegistry;
use metrics::{counter, gauge, histogram};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::config::ServerConfig;
use crate::metrics::{
    WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_CONNECTION_DURATION_SECONDS,
    WS_DISCONNECTIONS_TOTAL,
};

use super::connection::ClientConnection;
use super::connections::ConnectionManager;
use super::handler::{self, SessionState};

/// Drive one WebSocket connection from upgrade to disconnect.
#[instrument(skip_all, fields(connection_id = %connection_id))]
pub async fn run_ws_session(
    ws: WebSocket,
    connection_id: ConnectionId,
    rooms: Arc<RoomRegistry>,
    connections: Arc<ConnectionManager>,
    config: Arc<ServerConfig>,
    token: CancellationToken,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (tx, mut send_rx) = mpsc::channel::<String>(config.send_queue_depth);
    let connection = Arc::new(ClientConnection::new(connection_id, tx));

    info!("client connected");
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);
    connections.add(connection.clone());

    // Hello goes out on the raw sink before the outbound pump starts, so
    // it is always the first frame the client sees.
    let hello = ServerEvent::Connected {
        connection_id: connection.id().clone(),
    };
    if let Ok(json) = serde_json::to_string(&hello) {
        let _ = ws_tx.send(Message::Text(json.into())).await;
    }

    let heartbeat_interval = config.heartbeat_interval();
    let client_timeout = config.client_timeout();
    let ping_connection = connection.clone();
    let session_token = token.clone();
    let mut outbound = tokio::spawn(async move {
        let mut ping_interval = tokio::time::interval(heartbeat_interval);
        // The first tick completes immediately.
        let _ = ping_interval.tick().await;
        loop {
            tokio::select! {
                frame = send_rx.recv() => {
                    let Some(frame) = frame else { break };
                    if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                _ = ping_interval.tick() => {
                    if !ping_connection.check_alive()
                        && ping_connection.last_pong_elapsed() > client_timeout
                    {
                        warn!(
                            connection_id = %ping_connection.id(),
                            "client unresponsive, closing connection"
                        );
                        break;
                    }
                    if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
                () = session_token.cancelled() => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    let mut state = SessionState::Unjoined;
    loop {
        tokio::select! {
            maybe_msg = ws_rx.next() => {
                let Some(Ok(msg)) = maybe_msg else { break };
                match msg {
                    Message::Text(text) => {
                        handler::handle_message(text.as_str(), &mut state, &connection, &rooms);
                    }
                    Message::Binary(data) => {
                        // Some clients send text frames as binary.
                        if let Ok(text) = std::str::from_utf8(&data) {
                            handler::handle_message(text, &mut state, &connection, &rooms);
                        } else {
                            info!("ignoring non-UTF-8 binary frame");
                        }
                    }
                    Message::Close(_) => {
                        info!("client sent close frame");
                        break;
                    }
                    Message::Ping(_) | Message::Pong(_) => connection.mark_alive(),
                }
            }
            // The outbound pump exiting means the socket is unusable or
            // the server is shutting down.
            _ = &mut outbound => break,
        }
    }

    handler::handle_disconnect(&mut state, &connection, &rooms);

    let dropped = connection.drop_count();
    if dropped > 0 {
        warn!(dropped, "frames dropped on slow client queue");
    }
    info!(duration_secs = connection.age().as_secs(), "client disconnected");
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(connection.age().as_secs_f64());

    outbound.abort();
    connections.remove(connection.id());
}
