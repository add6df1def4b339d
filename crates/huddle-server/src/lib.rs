//! # huddle-server
//!
//! Axum HTTP + WebSocket server for the huddle relay. Owns the listener,
//! the per-connection session loops, and the HTTP surface (`/health`,
//! `/metrics`, `/ws`); room semantics live in `huddle-rooms`.

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod websocket;
