//! # huddle-rooms
//!
//! Room bookkeeping for the relay: membership, retained chat history,
//! presence, and frame fan-out.
//!
//! Rooms are transport-agnostic. Delivery goes through the [`RoomSink`]
//! trait, implemented by the WebSocket gateway in `huddle-server`, so
//! everything in this crate is testable with plain in-memory sinks.
//!
//! Each room guards its state with a single mutex, and every observable
//! effect of an operation (membership change, history append, frame
//! enqueue) happens under that lock. That is what makes a join's history
//! replay gapless with respect to live chat, and gives each room a total
//! order over its events. Sinks must never block.

#![deny(unsafe_code)]

pub mod history;
pub mod registry;
pub mod room;
pub mod sink;

#[cfg(test)]
pub(crate) mod test_support;

pub use history::HistoryBuffer;
pub use registry::RoomRegistry;
pub use room::{Delivery, JoinOutcome, LeaveOutcome, Room};
pub use sink::RoomSink;
