//! In-memory sink for room unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use huddle_core::ConnectionId;

use crate::sink::RoomSink;

/// Records every delivered frame; can be switched to reject deliveries
/// to stand in for a slow client with a full queue.
pub(crate) struct RecordingSink {
    id: ConnectionId,
    accept: AtomicBool,
    frames: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub(crate) fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: ConnectionId::from_string(id),
            accept: AtomicBool::new(true),
            frames: Mutex::new(Vec::new()),
        })
    }

    /// A sink whose deliveries always fail.
    pub(crate) fn rejecting(id: &str) -> Arc<Self> {
        let sink = Self::new(id);
        sink.accept.store(false, Ordering::Relaxed);
        sink
    }

    pub(crate) fn frames(&self) -> Vec<String> {
        self.frames.lock().clone()
    }

    /// The `type` field of each recorded frame, in delivery order.
    pub(crate) fn frame_types(&self) -> Vec<String> {
        self.frames
            .lock()
            .iter()
            .map(|frame| {
                let value: serde_json::Value =
                    serde_json::from_str(frame).expect("frame is valid JSON");
                value["type"].as_str().expect("frame has a type").to_string()
            })
            .collect()
    }

    pub(crate) fn clear(&self) {
        self.frames.lock().clear();
    }
}

impl RoomSink for RecordingSink {
    fn connection_id(&self) -> &ConnectionId {
        &self.id
    }

    fn deliver(&self, frame: String) -> bool {
        if !self.accept.load(Ordering::Relaxed) {
            return false;
        }
        self.frames.lock().push(frame);
        true
    }
}
