//! Protocol misuse codes and the notice sent back to offending clients.
//!
//! Misuse is never fatal to a connection. The gateway converts a
//! [`ProtocolError`] into an `error` event for the sender, drops the
//! offending frame, and keeps the session alive.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Machine-readable code carried by an `error` event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Frame was not valid JSON, named an unknown event, or failed
    /// field validation.
    #[serde(rename = "INVALID_PAYLOAD")]
    InvalidPayload,
    /// A join arrived on a connection that already joined a room.
    #[serde(rename = "ALREADY_JOINED")]
    AlreadyJoined,
    /// A chat or signal arrived before any join.
    #[serde(rename = "NOT_JOINED")]
    NotJoined,
    /// A signal named a room other than the one the sender joined.
    #[serde(rename = "ROOM_MISMATCH")]
    RoomMismatch,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Reuse the serde rename so the wire form and the log form
        // cannot drift apart.
        let s = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(s.trim_matches('"'))
    }
}

/// A rejected client event, paired with a human-readable explanation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtocolError {
    /// Stable code the client can branch on.
    pub code: ErrorCode,
    /// Free-form detail for logs and debugging clients.
    pub message: String,
}

impl ProtocolError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_payload(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPayload, detail)
    }

    #[must_use]
    pub fn already_joined(room: &str) -> Self {
        Self::new(
            ErrorCode::AlreadyJoined,
            format!("connection already joined room '{room}'"),
        )
    }

    #[must_use]
    pub fn not_joined(event: &str) -> Self {
        Self::new(
            ErrorCode::NotJoined,
            format!("'{event}' requires joining a room first"),
        )
    }

    #[must_use]
    pub fn room_mismatch(requested: &str, joined: &str) -> Self {
        Self::new(
            ErrorCode::RoomMismatch,
            format!("signal addressed room '{requested}' but connection joined '{joined}'"),
        )
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ProtocolError {}
