//! # huddle-relay
//!
//! Huddle relay server binary: loads settings, applies CLI overrides,
//! and starts the HTTP/WebSocket server.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use huddle_core::logging::init_subscriber;
use huddle_server::config::ServerConfig;
use huddle_server::server::RelayServer;
use huddle_settings::{HuddleSettings, load_settings, load_settings_from_path};

/// Huddle relay server.
#[derive(Parser, Debug)]
#[command(name = "huddle-relay", about = "Room-scoped chat and WebRTC signaling relay")]
struct Cli {
    /// Host to bind (overrides settings if specified).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings if specified).
    #[arg(long)]
    port: Option<u16>,

    /// Retained chat messages per room (overrides settings if specified).
    #[arg(long)]
    history_limit: Option<usize>,

    /// Path to the settings file (defaults to `~/.huddle/settings.json`).
    #[arg(long)]
    settings_path: Option<PathBuf>,
}

/// Settings provide the defaults; CLI flags win where given.
fn effective_config(settings: &HuddleSettings, args: &Cli) -> ServerConfig {
    let mut config = ServerConfig::from_settings(settings);
    if let Some(host) = &args.host {
        config.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(limit) = args.history_limit {
        config.history_limit = limit;
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Load settings early (needed for log level before logging init).
    let settings = match &args.settings_path {
        Some(path) => load_settings_from_path(path),
        None => load_settings(),
    }
    .unwrap_or_default();

    init_subscriber(settings.logging.level.as_filter_str());

    let metrics = huddle_server::metrics::install_recorder();
    let config = effective_config(&settings, &args);
    let server = RelayServer::new(config, metrics);

    let (addr, handle) = server.listen().await.context("Failed to bind server")?;
    tracing::info!("huddle relay listening on http://{addr}");

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    server.shutdown().graceful_shutdown(vec![handle], None).await;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_defaults_to_no_overrides() {
        let cli = Cli::parse_from(["huddle-relay"]);
        assert_eq!(cli.host, None);
        assert_eq!(cli.port, None);
        assert_eq!(cli.history_limit, None);
        assert_eq!(cli.settings_path, None);
    }

    #[test]
    fn cli_custom_host() {
        let cli = Cli::parse_from(["huddle-relay", "--host", "127.0.0.1"]);
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn cli_custom_port() {
        let cli = Cli::parse_from(["huddle-relay", "--port", "8080"]);
        assert_eq!(cli.port, Some(8080));
    }

    #[test]
    fn cli_history_limit() {
        let cli = Cli::parse_from(["huddle-relay", "--history-limit", "50"]);
        assert_eq!(cli.history_limit, Some(50));
    }

    #[test]
    fn cli_settings_path() {
        let cli = Cli::parse_from(["huddle-relay", "--settings-path", "/tmp/settings.json"]);
        assert_eq!(cli.settings_path, Some(PathBuf::from("/tmp/settings.json")));
    }

    #[test]
    fn effective_config_uses_settings_defaults() {
        let settings = HuddleSettings::default();
        let args = Cli::parse_from(["huddle-relay"]);

        let config = effective_config(&settings, &args);

        assert_eq!(config.host, settings.server.host);
        assert_eq!(config.port, settings.server.port);
        assert_eq!(config.history_limit, settings.rooms.history_limit);
    }

    #[test]
    fn effective_config_cli_overrides_settings() {
        let settings = HuddleSettings::default();
        let args = Cli::parse_from([
            "huddle-relay",
            "--host",
            "10.0.0.1",
            "--port",
            "4444",
            "--history-limit",
            "7",
        ]);

        let config = effective_config(&settings, &args);

        assert_eq!(config.host, "10.0.0.1");
        assert_eq!(config.port, 4444);
        assert_eq!(config.history_limit, 7);
        // Untouched fields still come from settings.
        assert_eq!(config.max_connections, settings.server.max_connections);
    }

    #[tokio::test]
    async fn server_boots_and_responds() {
        let metrics = metrics_exporter_prometheus::PrometheusBuilder::new()
            .build_recorder()
            .handle();
        // Default config binds an ephemeral port.
        let server = RelayServer::new(ServerConfig::default(), metrics);

        let (addr, handle) = server.listen().await.unwrap();

        let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
        assert!(resp.status().is_success());
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");

        server.shutdown().shutdown();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn server_graceful_shutdown() {
        let metrics = metrics_exporter_prometheus::PrometheusBuilder::new()
            .build_recorder()
            .handle();
        let server = RelayServer::new(ServerConfig::default(), metrics);
        let (_, handle) = server.listen().await.unwrap();

        server.shutdown().shutdown();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("shutdown timed out")
            .expect("join error");
    }
}
