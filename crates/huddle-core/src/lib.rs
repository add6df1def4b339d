//! # huddle-core
//!
//! Foundation types shared across the huddle workspace: the branded
//! connection identifier, the client/server wire protocol, protocol
//! error codes, and tracing setup.
//!
//! Everything here is transport-agnostic. The WebSocket plumbing lives
//! in `huddle-server`; room bookkeeping lives in `huddle-rooms`.

#![deny(unsafe_code)]

pub mod errors;
pub mod ids;
pub mod logging;
pub mod protocol;

pub use errors::{ErrorCode, ProtocolError};
pub use ids::ConnectionId;
pub use protocol::{ChatMessage, ClientEvent, ServerEvent, SignalKind};
