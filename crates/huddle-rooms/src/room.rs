//! A single room: members, history, and event fan-out.
//!
//! All room state sits behind one mutex. Operations that touch several
//! pieces of state (a join adds the member, replays history, and
//! notifies the others) do so in one critical section, so no observer
//! can see a half-applied join and no frame can slip between a history
//! replay and the live traffic that follows it. Delivery is fire-and-
//! forget through [`RoomSink`], which never blocks, so holding the lock
//! across fan-out is safe.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use huddle_core::{ChatMessage, ConnectionId, ServerEvent, SignalKind};

use crate::history::HistoryBuffer;
use crate::sink::RoomSink;

/// Result of [`Room::join`].
#[derive(Debug)]
pub enum JoinOutcome {
    /// Member added, history replayed, others notified.
    Joined {
        /// Member count after the join.
        members: usize,
    },
    /// The room was drained and closed before the join could land. The
    /// caller should retry against a fresh room.
    Closed,
}

/// Result of [`Room::leave`].
#[derive(Debug)]
pub enum LeaveOutcome {
    /// Member removed; the rest of the room was notified.
    Left {
        username: String,
        /// Member count after the leave.
        remaining: usize,
    },
    /// The last member left. The room is now closed and rejects joins;
    /// the registry drops it from the map.
    Emptied { username: String },
    /// The connection was not a member. Nothing changed.
    NotMember,
}

/// Fan-out tally for one event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Recipients whose queue accepted the frame.
    pub sent: usize,
    /// Recipients whose frame was dropped.
    pub dropped: usize,
}

struct Member {
    username: String,
    sink: Arc<dyn RoomSink>,
}

struct RoomInner {
    /// Insertion order. Duplicate usernames are allowed; entries are
    /// keyed by connection identity.
    members: Vec<Member>,
    history: HistoryBuffer,
    /// Set when the last member leaves. A closed room never accepts
    /// another join and never reopens.
    closed: bool,
}

/// A named room.
///
/// Created by [`RoomRegistry::join`] on first use of a name and dropped
/// when its last member leaves.
///
/// [`RoomRegistry::join`]: crate::registry::RoomRegistry::join
pub struct Room {
    name: String,
    inner: Mutex<RoomInner>,
}

impl Room {
    #[must_use]
    pub fn new(name: impl Into<String>, history_limit: usize) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(RoomInner {
                members: Vec::new(),
                history: HistoryBuffer::new(history_limit),
                closed: false,
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a member.
    ///
    /// In one critical section: existing members get `user joined`, the
    /// member is recorded, the joiner gets the history replay, and the
    /// whole room (joiner included) gets the fresh roster.
    pub fn join(&self, username: &str, sink: Arc<dyn RoomSink>) -> JoinOutcome {
        let mut inner = self.inner.lock();
        if inner.closed {
            return JoinOutcome::Closed;
        }

        if let Some(json) = encode(&ServerEvent::UserJoined {
            username: username.to_string(),
        }) {
            let _ = deliver_to(&inner.members, &json, None, &self.name);
        }

        inner.members.push(Member {
            username: username.to_string(),
            sink: Arc::clone(&sink),
        });

        if let Some(json) = encode(&ServerEvent::ChatHistory {
            messages: inner.history.snapshot(),
        }) {
            if !sink.deliver(json) {
                warn!(conn_id = %sink.connection_id(), room = %self.name, "dropped history replay");
            }
        }

        if let Some(json) = encode(&ServerEvent::RoomUsers {
            users: usernames(&inner.members),
        }) {
            let _ = deliver_to(&inner.members, &json, None, &self.name);
        }

        debug!(room = %self.name, username, members = inner.members.len(), "member joined");
        JoinOutcome::Joined {
            members: inner.members.len(),
        }
    }

    /// Remove a member by connection identity.
    ///
    /// Unknown connections are a no-op. When the removal empties the
    /// room it closes instead of notifying, since nobody is left to
    /// hear it.
    pub fn leave(&self, connection_id: &ConnectionId) -> LeaveOutcome {
        let mut inner = self.inner.lock();
        let Some(index) = inner
            .members
            .iter()
            .position(|m| m.sink.connection_id() == connection_id)
        else {
            return LeaveOutcome::NotMember;
        };

        let member = inner.members.remove(index);
        if inner.members.is_empty() {
            inner.closed = true;
            debug!(room = %self.name, username = %member.username, "last member left, room closed");
            return LeaveOutcome::Emptied {
                username: member.username,
            };
        }

        if let Some(json) = encode(&ServerEvent::UserLeft {
            username: member.username.clone(),
        }) {
            let _ = deliver_to(&inner.members, &json, None, &self.name);
        }
        if let Some(json) = encode(&ServerEvent::RoomUsers {
            users: usernames(&inner.members),
        }) {
            let _ = deliver_to(&inner.members, &json, None, &self.name);
        }

        debug!(room = %self.name, username = %member.username, remaining = inner.members.len(), "member left");
        LeaveOutcome::Left {
            username: member.username,
            remaining: inner.members.len(),
        }
    }

    /// Append a chat message to history and broadcast it to every
    /// member, the author included.
    pub fn broadcast_chat(&self, message: ChatMessage) -> Delivery {
        let mut inner = self.inner.lock();
        let event = ServerEvent::Chat(message.clone());
        inner.history.push(message);

        let Some(json) = encode(&event) else {
            return Delivery::default();
        };
        debug!(room = %self.name, recipients = inner.members.len(), "broadcast chat");
        deliver_to(&inner.members, &json, None, &self.name)
    }

    /// Relay an opaque signaling payload to every member except the
    /// sender. Signals are never retained.
    pub fn relay_signal(
        &self,
        kind: SignalKind,
        sender: &ConnectionId,
        payload: Value,
    ) -> Delivery {
        let inner = self.inner.lock();
        let Some(json) = encode(&kind.into_event(payload)) else {
            return Delivery::default();
        };
        debug!(room = %self.name, signal = %kind, "relay signal");
        deliver_to(&inner.members, &json, Some(sender), &self.name)
    }

    /// Display names of current members, join order, duplicates kept.
    #[must_use]
    pub fn member_names(&self) -> Vec<String> {
        usernames(&self.inner.lock().members)
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.inner.lock().members.len()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Copy of the retained chat history, oldest first.
    #[must_use]
    pub fn history_snapshot(&self) -> Vec<ChatMessage> {
        self.inner.lock().history.snapshot()
    }
}

fn usernames(members: &[Member]) -> Vec<String> {
    members.iter().map(|m| m.username.clone()).collect()
}

fn encode(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!(error = %e, "failed to serialize event");
            None
        }
    }
}

/// Push one frame to each member, skipping `exclude`. A recipient whose
/// sink refuses the frame is skipped without affecting the others.
fn deliver_to(
    members: &[Member],
    json: &str,
    exclude: Option<&ConnectionId>,
    room: &str,
) -> Delivery {
    let mut delivery = Delivery::default();
    for member in members {
        if exclude.is_some_and(|id| member.sink.connection_id() == id) {
            continue;
        }
        if member.sink.deliver(json.to_string()) {
            delivery.sent += 1;
        } else {
            delivery.dropped += 1;
            warn!(
                conn_id = %member.sink.connection_id(),
                room,
                "dropped frame for slow client"
            );
        }
    }
    delivery
}
