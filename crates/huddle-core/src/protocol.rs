//! The JSON wire protocol spoken over `/ws`.
//!
//! Every frame is a single JSON object tagged by a `type` field. Tag
//! strings follow the browser client verbatim, spaces included, so the
//! enums below are the only place the wire names appear.
//!
//! Signal payloads (`offer`, `answer`, `candidate`) are opaque: the
//! server relays whatever JSON the sender produced without inspecting
//! it, so the SDP and ICE shapes can evolve without a server change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ErrorCode, ProtocolError};
use crate::ids::ConnectionId;

/// Frames a client may send.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Enter a room under a display name. First and only join for the
    /// life of the connection.
    #[serde(rename = "join")]
    Join { username: String, room: String },
    /// Broadcast chat to everyone in the sender's room.
    #[serde(rename = "chat message")]
    Chat { text: String },
    /// WebRTC session offer, relayed to the rest of the room.
    #[serde(rename = "offer")]
    Offer { payload: Value, room: String },
    /// WebRTC session answer, relayed to the rest of the room.
    #[serde(rename = "answer")]
    Answer { payload: Value, room: String },
    /// ICE candidate, relayed to the rest of the room.
    #[serde(rename = "candidate")]
    Candidate { payload: Value, room: String },
}

impl ClientEvent {
    /// Wire name of this event, for logs and misuse notices.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Chat { .. } => "chat message",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Candidate { .. } => "candidate",
        }
    }
}

/// Frames the server may send.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// First frame on every connection, before any join.
    #[serde(rename = "connected")]
    Connected {
        #[serde(rename = "connectionId")]
        connection_id: ConnectionId,
    },
    /// Replay of the room's retained messages, oldest first. Sent to
    /// the joiner only, before any live traffic from the room.
    #[serde(rename = "chat history")]
    ChatHistory { messages: Vec<ChatMessage> },
    /// A member entered the room. Not sent to the member itself.
    #[serde(rename = "user joined")]
    UserJoined { username: String },
    /// A member left the room, by leaving or by disconnect.
    #[serde(rename = "user left")]
    UserLeft { username: String },
    /// Current display names in the room, join order, duplicates kept.
    #[serde(rename = "room users")]
    RoomUsers { users: Vec<String> },
    /// Live chat, delivered to the whole room including the sender.
    #[serde(rename = "chat message")]
    Chat(ChatMessage),
    /// Relayed WebRTC offer.
    #[serde(rename = "offer")]
    Offer { payload: Value },
    /// Relayed WebRTC answer.
    #[serde(rename = "answer")]
    Answer { payload: Value },
    /// Relayed ICE candidate.
    #[serde(rename = "candidate")]
    Candidate { payload: Value },
    /// Misuse notice for the offending connection. Never fatal.
    #[serde(rename = "error")]
    Error { code: ErrorCode, message: String },
}

impl From<ProtocolError> for ServerEvent {
    fn from(err: ProtocolError) -> Self {
        Self::Error {
            code: err.code,
            message: err.message,
        }
    }
}

/// One chat message as stored in history and broadcast live.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Display name of the author.
    pub user: String,
    /// Message body, relayed untouched.
    pub text: String,
    /// Server-side receive time.
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Stamps a new message with the current time.
    #[must_use]
    pub fn new(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The three relayed signal flavors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
}

impl SignalKind {
    /// Wire name, shared with metric labels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::Candidate => "candidate",
        }
    }

    /// Wraps a relayed payload in the matching server frame.
    #[must_use]
    pub fn into_event(self, payload: Value) -> ServerEvent {
        match self {
            Self::Offer => ServerEvent::Offer { payload },
            Self::Answer => ServerEvent::Answer { payload },
            Self::Candidate => ServerEvent::Candidate { payload },
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
