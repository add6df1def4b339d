//! WebSocket message dispatch: parses incoming text as `ClientEvent` and
//! advances the connection's room state machine.
//!
//! Misuse never kills a connection. Every rejected frame turns into an
//! `error` notice for the sender while membership, history, and the rest
//! of the room stay exactly as they were.

use std::sync::Arc;

use huddle_core::{ChatMessage, ClientEvent, ProtocolError, ServerEvent, SignalKind};
use huddle_rooms::{Delivery, LeaveOutcome, Room, RoomRegistry, RoomSink};
use metrics::counter;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::metrics::{
    CHAT_MESSAGES_TOTAL, PROTOCOL_ERRORS_TOTAL, ROOM_JOINS_TOTAL, SIGNALS_RELAYED_TOTAL,
    WS_BROADCAST_DROPS_TOTAL,
};

use super::connection::ClientConnection;

/// Room membership of one connection, advanced by [`handle_message`].
pub enum SessionState {
    /// Connected, not yet in a room.
    Unjoined,
    /// Joined a room under a display name. Terminal apart from disconnect:
    /// a connection never changes rooms.
    Joined {
        username: String,
        room: Arc<Room>,
    },
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unjoined => f.write_str("Unjoined"),
            Self::Joined { username, room } => f
                .debug_struct("Joined")
                .field("username", username)
                .field("room", &room.name())
                .finish(),
        }
    }
}

/// Handle one incoming text frame.
#[instrument(skip_all, fields(connection_id = %connection.id(), event))]
pub fn handle_message(
    message: &str,
    state: &mut SessionState,
    connection: &Arc<ClientConnection>,
    rooms: &RoomRegistry,
) {
    let event: ClientEvent = match serde_json::from_str(message) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "unparseable frame");
            send_error(connection, ProtocolError::invalid_payload(e.to_string()));
            return;
        }
    };

    let _ = tracing::Span::current().record("event", event.name());
    debug!(event = event.name(), "dispatching client event");

    match event {
        ClientEvent::Join { username, room } => join(state, connection, rooms, username, &room),
        ClientEvent::Chat { text } => chat(state, connection, text),
        ClientEvent::Offer { payload, room } => {
            relay(state, connection, SignalKind::Offer, payload, &room);
        }
        ClientEvent::Answer { payload, room } => {
            relay(state, connection, SignalKind::Answer, payload, &room);
        }
        ClientEvent::Candidate { payload, room } => {
            relay(state, connection, SignalKind::Candidate, payload, &room);
        }
    }
}

/// Leave the joined room, if any. Called once when the session ends.
pub fn handle_disconnect(
    state: &mut SessionState,
    connection: &Arc<ClientConnection>,
    rooms: &RoomRegistry,
) {
    let SessionState::Joined { username, room } =
        std::mem::replace(state, SessionState::Unjoined)
    else {
        return;
    };

    match rooms.leave(&room, connection.id()) {
        LeaveOutcome::Left { remaining, .. } => {
            debug!(room = room.name(), username, remaining, "left room on disconnect");
        }
        LeaveOutcome::Emptied { .. } => {
            debug!(room = room.name(), username, "left room on disconnect, room emptied");
        }
        // Already gone; nothing to do.
        LeaveOutcome::NotMember => {}
    }
    crate::metrics::set_rooms_active(rooms.room_count());
}

fn join(
    state: &mut SessionState,
    connection: &Arc<ClientConnection>,
    rooms: &RoomRegistry,
    username: String,
    room_name: &str,
) {
    if let SessionState::Joined { room, .. } = state {
        warn!(joined = room.name(), requested = room_name, "join on already-joined connection");
        send_error(connection, ProtocolError::already_joined(room.name()));
        return;
    }

    if username.trim().is_empty() || room_name.trim().is_empty() {
        send_error(
            connection,
            ProtocolError::invalid_payload("join requires a non-empty username and room"),
        );
        return;
    }

    let sink: Arc<dyn RoomSink> = connection.clone();
    let room = rooms.join(room_name, &username, sink);
    counter!(ROOM_JOINS_TOTAL).increment(1);
    crate::metrics::set_rooms_active(rooms.room_count());
    *state = SessionState::Joined { username, room };
}

fn chat(state: &mut SessionState, connection: &Arc<ClientConnection>, text: String) {
    let SessionState::Joined { username, room } = state else {
        send_error(connection, ProtocolError::not_joined("chat message"));
        return;
    };

    let delivery = room.broadcast_chat(ChatMessage::new(username.clone(), text));
    counter!(CHAT_MESSAGES_TOTAL).increment(1);
    record_drops(delivery);
}

fn relay(
    state: &mut SessionState,
    connection: &Arc<ClientConnection>,
    kind: SignalKind,
    payload: Value,
    requested_room: &str,
) {
    let SessionState::Joined { room, .. } = state else {
        send_error(connection, ProtocolError::not_joined(kind.as_str()));
        return;
    };

    if room.name() != requested_room {
        warn!(
            requested = requested_room,
            joined = room.name(),
            signal = %kind,
            "signal addressed to a different room, dropping"
        );
        send_error(
            connection,
            ProtocolError::room_mismatch(requested_room, room.name()),
        );
        return;
    }

    let delivery = room.relay_signal(kind, connection.id(), payload);
    counter!(SIGNALS_RELAYED_TOTAL, "kind" => kind.as_str()).increment(1);
    record_drops(delivery);
}

/// Send a misuse notice to the offending client only.
fn send_error(connection: &Arc<ClientConnection>, error: ProtocolError) {
    counter!(PROTOCOL_ERRORS_TOTAL, "code" => error.code.to_string()).increment(1);
    let event = ServerEvent::from(error);
    if let Ok(json) = serde_json::to_string(&event) {
        if !connection.send(json) {
            warn!(connection_id = %connection.id(), "dropped error notice");
        }
    }
}

fn record_drops(delivery: Delivery) {
    if delivery.dropped > 0 {
        counter!(WS_BROADCAST_DROPS_TOTAL).increment(delivery.dropped as u64);
    }
}
