//! Transport seam between rooms and the gateway.

use huddle_core::ConnectionId;

/// Outbound half of a connection, as seen by a room.
///
/// Rooms call [`deliver`] while holding their internal lock, so
/// implementations must not block. A frame that cannot be enqueued
/// (closed peer, full queue) is reported by returning `false` and is
/// lost for that recipient only; the room never retries.
///
/// [`deliver`]: RoomSink::deliver
pub trait RoomSink: Send + Sync + 'static {
    /// Identity of the connection behind this sink.
    fn connection_id(&self) -> &ConnectionId;

    /// Enqueue one serialized frame for this recipient.
    fn deliver(&self, frame: String) -> bool;
}
