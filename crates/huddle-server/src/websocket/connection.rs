//! WebSocket client connection state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use huddle_core::ConnectionId;
use huddle_rooms::RoomSink;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Represents a connected WebSocket client.
///
/// Doubles as the room-side [`RoomSink`]: rooms hand frames to the
/// connection's send queue without knowing anything about sockets.
pub struct ClientConnection {
    id: ConnectionId,
    /// Send channel to the client's WebSocket write task.
    tx: mpsc::Sender<String>,
    /// When this connection was established.
    connected_at: Instant,
    /// Whether the client has answered the last ping.
    is_alive: AtomicBool,
    /// When the last Pong was received.
    last_pong: Mutex<Instant>,
    /// Count of frames dropped due to a full or closed queue.
    dropped_frames: AtomicU64,
}

impl ClientConnection {
    /// Create a new connection.
    #[must_use]
    pub fn new(id: ConnectionId, tx: mpsc::Sender<String>) -> Self {
        let now = Instant::now();
        Self {
            id,
            tx,
            connected_at: now,
            is_alive: AtomicBool::new(true),
            last_pong: Mutex::new(now),
            dropped_frames: AtomicU64::new(0),
        }
    }

    /// Unique connection ID.
    #[must_use]
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Enqueue a text frame for the client.
    ///
    /// Returns `false` if the queue is full or closed, and increments
    /// the dropped frame counter.
    pub fn send(&self, frame: String) -> bool {
        if self.tx.try_send(frame).is_ok() {
            true
        } else {
            let _ = self.dropped_frames.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Total frames dropped for this connection.
    #[must_use]
    pub fn drop_count(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Mark the connection as alive (pong received).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Duration since the last pong (or connection establishment).
    #[must_use]
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Check and reset the alive flag for heartbeat.
    ///
    /// Returns `true` if the connection was alive since the last check.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Connection age.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl RoomSink for ClientConnection {
    fn connection_id(&self) -> &ConnectionId {
        &self.id
    }

    fn deliver(&self, frame: String) -> bool {
        self.send(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn make_connection() -> (ClientConnection, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(32);
        let conn = ClientConnection::new(ConnectionId::from_string("conn_1"), tx);
        (conn, rx)
    }

    #[test]
    fn create_connection() {
        let (conn, _rx) = make_connection();
        assert_eq!(conn.id().as_str(), "conn_1");
        assert_eq!(conn.drop_count(), 0);
    }

    #[tokio::test]
    async fn send_frame_success() {
        let (conn, mut rx) = make_connection();
        assert!(conn.send("hello".into()));
        let frame = rx.recv().await.unwrap();
        assert_eq!(frame, "hello");
    }

    #[tokio::test]
    async fn send_to_closed_channel_returns_false() {
        let (tx, rx) = mpsc::channel(32);
        let conn = ClientConnection::new(ConnectionId::from_string("conn_2"), tx);
        drop(rx);
        assert!(!conn.send("hello".into()));
        assert_eq!(conn.drop_count(), 1);
    }

    #[tokio::test]
    async fn send_to_full_channel_counts_drops() {
        let (tx, _rx) = mpsc::channel(1);
        let conn = ClientConnection::new(ConnectionId::from_string("conn_3"), tx);
        assert!(conn.send("msg1".into()));
        // Queue is now full
        assert!(!conn.send("msg2".into()));
        assert!(!conn.send("msg3".into()));
        assert_eq!(conn.drop_count(), 2);
    }

    #[test]
    fn mark_alive_and_check() {
        let (conn, _rx) = make_connection();
        // Initially alive
        assert!(conn.check_alive());
        // After check, no longer alive
        assert!(!conn.check_alive());
        // Mark alive again
        conn.mark_alive();
        assert!(conn.check_alive());
    }

    #[test]
    fn check_alive_resets_flag() {
        let (conn, _rx) = make_connection();
        conn.mark_alive();
        assert!(conn.check_alive());
        assert!(!conn.check_alive());
    }

    #[test]
    fn mark_alive_resets_pong_clock() {
        let (conn, _rx) = make_connection();
        std::thread::sleep(Duration::from_millis(10));
        conn.mark_alive();
        assert!(conn.last_pong_elapsed() < Duration::from_millis(10));
    }

    #[test]
    fn connection_age_increases() {
        let (conn, _rx) = make_connection();
        let age1 = conn.age();
        std::thread::sleep(Duration::from_millis(10));
        let age2 = conn.age();
        assert!(age2 > age1);
    }

    #[tokio::test]
    async fn sink_delivers_through_trait_object() {
        let (tx, mut rx) = mpsc::channel(32);
        let conn = Arc::new(ClientConnection::new(ConnectionId::from_string("conn_4"), tx));
        let sink: Arc<dyn RoomSink> = conn.clone();
        assert_eq!(sink.connection_id().as_str(), "conn_4");
        assert!(sink.deliver("frame".into()));
        assert_eq!(rx.recv().await.unwrap(), "frame");
    }

    #[tokio::test]
    async fn send_multiple_frames_in_order() {
        let (conn, mut rx) = make_connection();
        for i in 0..5 {
            assert!(conn.send(format!("msg_{i}")));
        }
        for i in 0..5 {
            assert_eq!(rx.recv().await.unwrap(), format!("msg_{i}"));
        }
    }
}
