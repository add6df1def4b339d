//! Name-to-room map with atomic create-on-join and destroy-on-empty.
//!
//! Room lifecycle is driven entirely by membership: a join against an
//! unknown name creates the room, and the leave that empties a room
//! destroys it, history included. Reusing the name later starts from
//! scratch.
//!
//! The racy edge is a join landing while the last leaver is tearing the
//! room down. The room resolves it by closing itself under its own lock
//! when it empties; a join that finds a closed room retries against a
//! fresh entry. `Arc::ptr_eq` guards the map removal so a freshly
//! created namesake is never torn down by a stale leaver.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use huddle_core::ConnectionId;

use crate::room::{JoinOutcome, LeaveOutcome, Room};
use crate::sink::RoomSink;

/// All live rooms, keyed by name.
pub struct RoomRegistry {
    rooms: DashMap<String, Arc<Room>>,
    history_limit: usize,
}

impl RoomRegistry {
    /// `history_limit` caps retained chat per room; `0` means unbounded.
    #[must_use]
    pub fn new(history_limit: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            history_limit,
        }
    }

    /// Join a room by name, creating it on first use.
    ///
    /// Returns the room the member landed in. The returned `Arc` is the
    /// member's handle for chat, signaling, and its eventual leave.
    pub fn join(&self, room_name: &str, username: &str, sink: Arc<dyn RoomSink>) -> Arc<Room> {
        loop {
            let room = {
                let entry = self
                    .rooms
                    .entry(room_name.to_string())
                    .or_insert_with(|| Arc::new(Room::new(room_name, self.history_limit)));
                Arc::clone(entry.value())
            };

            match room.join(username, Arc::clone(&sink)) {
                JoinOutcome::Joined { members } => {
                    debug!(room = room_name, username, members, "joined room");
                    return room;
                }
                JoinOutcome::Closed => {
                    // Lost the race with the last leaver: the map still
                    // holds the drained room. Drop that exact entry and
                    // retry with a fresh one.
                    let _ = self
                        .rooms
                        .remove_if(room_name, |_, current| Arc::ptr_eq(current, &room));
                }
            }
        }
    }

    /// Remove a member from its room, destroying the room if it empties.
    pub fn leave(&self, room: &Arc<Room>, connection_id: &ConnectionId) -> LeaveOutcome {
        let outcome = room.leave(connection_id);
        if let LeaveOutcome::Emptied { username } = &outcome {
            let _ = self
                .rooms
                .remove_if(room.name(), |_, current| Arc::ptr_eq(current, room));
            debug!(room = room.name(), username, "room emptied, destroyed");
        }
        outcome
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Room>> {
        self.rooms.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Display names in a room, join order. Unknown rooms are empty.
    #[must_use]
    pub fn member_names(&self, name: &str) -> Vec<String> {
        self.get(name).map(|room| room.member_names()).unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.rooms.contains_key(name)
    }

    /// Number of live rooms.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
