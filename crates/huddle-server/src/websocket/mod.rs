//! WebSocket connection handling: per-client state, the session loop,
//! and message dispatch into `huddle-rooms`.

pub mod connection;
pub mod connections;
pub mod handler;
pub mod session;
