//! HTTP server wiring: the axum router, the `/ws` upgrade path, and the
//! listener lifecycle.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use huddle_core::ConnectionId;
use huddle_rooms::RoomRegistry;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::health::{HealthResponse, health_check};
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::connections::ConnectionManager;
use crate::websocket::session::run_ws_session;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub connections: Arc<ConnectionManager>,
    pub rooms: Arc<RoomRegistry>,
    pub shutdown: Arc<ShutdownCoordinator>,
    pub config: Arc<ServerConfig>,
    pub metrics: PrometheusHandle,
    pub start_time: Instant,
}

/// The relay server: room registry, connection tracking, and the HTTP
/// surface that feeds them.
pub struct RelayServer {
    config: Arc<ServerConfig>,
    rooms: Arc<RoomRegistry>,
    connections: Arc<ConnectionManager>,
    shutdown: Arc<ShutdownCoordinator>,
    metrics: PrometheusHandle,
    start_time: Instant,
}

impl RelayServer {
    /// Creates a server from a config and an installed metrics recorder
    /// handle.
    #[must_use]
    pub fn new(config: ServerConfig, metrics: PrometheusHandle) -> Self {
        let config = Arc::new(config);
        Self {
            rooms: Arc::new(RoomRegistry::new(config.history_limit)),
            connections: Arc::new(ConnectionManager::new()),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            metrics,
            start_time: Instant::now(),
            config,
        }
    }

    /// Builds the axum router with all routes and shared state.
    #[must_use]
    pub fn router(&self) -> Router {
        let state = AppState {
            connections: self.connections.clone(),
            rooms: self.rooms.clone(),
            shutdown: self.shutdown.clone(),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
            start_time: self.start_time,
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/ws", get(ws_handler))
            .with_state(state)
            .layer(CorsLayer::permissive())
    }

    /// Binds the configured address and serves until shutdown is
    /// signalled. Returns the bound address and the serve task handle.
    pub async fn listen(&self) -> io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener =
            tokio::net::TcpListener::bind(format!("{}:{}", self.config.host, self.config.port))
                .await?;
        let addr = listener.local_addr()?;
        info!(%addr, "relay server listening");

        let router = self.router();
        let token = self.shutdown.token();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(e) = serve.await {
                warn!(error = %e, "server task exited with error");
            }
        });

        Ok((addr, handle))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    pub fn rooms(&self) -> &Arc<RoomRegistry> {
        &self.rooms
    }

    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health_check(
        state.start_time,
        state.connections.count(),
        state.rooms.room_count(),
    ))
}

async fn metrics_handler(State(state): State<AppState>) -> String {
    crate::metrics::render(&state.metrics)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    if state.connections.count() >= state.config.max_connections {
        warn!(
            active = state.connections.count(),
            limit = state.config.max_connections,
            "connection limit reached, refusing upgrade"
        );
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    ws.max_message_size(state.config.max_message_bytes)
        .on_upgrade(move |socket| {
            run_ws_session(
                socket,
                ConnectionId::new(),
                state.rooms,
                state.connections,
                state.config,
                state.shutdown.token(),
            )
        })
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::time::Duration;
    use tower::ServiceExt;

    fn make_server() -> RelayServer {
        let metrics = PrometheusBuilder::new().build_recorder().handle();
        RelayServer::new(ServerConfig::default(), metrics)
    }

    #[test]
    fn server_starts_with_no_connections_or_rooms() {
        let server = make_server();
        assert_eq!(server.connections().count(), 0);
        assert_eq!(server.rooms().room_count(), 0);
        assert!(!server.shutdown().is_shutting_down());
    }

    #[test]
    fn shutdown_cancels_session_tokens() {
        let server = make_server();
        let token = server.shutdown().token();
        assert!(!token.is_cancelled());

        server.shutdown().shutdown();

        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn health_endpoint_reports_counts() {
        let server = make_server();
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 10_000).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["connections"], 0);
        assert_eq!(json["rooms"], 0);
    }

    #[tokio::test]
    async fn metrics_endpoint_responds() {
        let server = make_server();
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let server = make_server();
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ws_route_requires_upgrade_headers() {
        let server = make_server();
        let response = server
            .router()
            .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        // The route exists; a plain GET fails the upgrade handshake.
        assert_ne!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn listen_binds_and_stops_on_shutdown() {
        let server = make_server();
        let (addr, handle) = server.listen().await.unwrap();
        assert_ne!(addr.port(), 0);

        server.shutdown().shutdown();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("server should stop after shutdown")
            .unwrap();
    }
}
