//! Live connection registry.

use std::sync::Arc;

use dashmap::DashMap;
use huddle_core::ConnectionId;

use super::connection::ClientConnection;

/// Tracks every open WebSocket, for capacity checks and `/health`.
pub struct ConnectionManager {
    connections: DashMap<ConnectionId, Arc<ClientConnection>>,
}

impl ConnectionManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a connection.
    pub fn add(&self, connection: Arc<ClientConnection>) {
        let _ = self
            .connections
            .insert(connection.id().clone(), connection);
    }

    /// Remove a connection by ID.
    pub fn remove(&self, connection_id: &ConnectionId) {
        let _ = self.connections.remove(connection_id);
    }

    /// Number of open connections.
    #[must_use]
    pub fn count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
