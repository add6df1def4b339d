//! Branded identifier for client connections.
//!
//! A [`ConnectionId`] is assigned by the gateway the moment a socket is
//! accepted and never reused for the lifetime of the process. It is a
//! UUIDv7 string, so IDs sort roughly by accept time.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single WebSocket connection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Wraps an existing string without validation.
    #[must_use]
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier, returning the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for ConnectionId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ConnectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConnectionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ConnectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<ConnectionId> for String {
    fn from(value: ConnectionId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn new_ids_are_valid_uuids() {
        let id = ConnectionId::new();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn from_string_preserves_value() {
        let id = ConnectionId::from_string("conn-1");
        assert_eq!(id.as_str(), "conn-1");
        assert_eq!(id.into_inner(), "conn-1");
    }

    #[test]
    fn display_matches_inner() {
        let id = ConnectionId::from_string("conn-2");
        assert_eq!(id.to_string(), "conn-2");
    }

    #[test]
    fn serializes_transparently() {
        let id = ConnectionId::from_string("conn-3");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"conn-3\"");

        let back: ConnectionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn derefs_to_str() {
        let id = ConnectionId::from_string("conn-4");
        assert!(id.starts_with("conn"));
    }

    #[test]
    fn converts_to_and_from_string() {
        let id: ConnectionId = "conn-5".into();
        let s: String = id.clone().into();
        assert_eq!(s, "conn-5");
        assert_eq!(ConnectionId::from(s), id);
    }
}
