use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::AppError;

/// Opaque participant identity, unique within one room's lifetime
pub type Identity = String;

/// Room identifier - any non-empty string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Validates a raw room identifier
    pub fn parse(raw: impl Into<String>) -> Result<Self, AppError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(AppError::BadRequest("Room id must not be empty".to_string()));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<RoomId> for String {
    fn from(value: RoomId) -> Self {
        value.0
    }
}

/// What happened in a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    /// A member joined
    Joined,
    /// A member left, disconnected or was pruned
    Left,
    /// Application-defined signal relayed verbatim (offer, answer, candidate...)
    Signal(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Joined => "joined",
            EventType::Left => "left",
            EventType::Signal(signal_type) => signal_type,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record fanned out to the members of a room
///
/// Membership events are produced by the server; signal events carry the
/// client's payload without interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomEvent {
    pub from: Identity,
    pub event_type: EventType,
    pub payload: String,
    pub room_id: RoomId,
}

impl RoomEvent {
    pub fn joined(room_id: RoomId, identity: &str) -> Self {
        Self {
            from: identity.to_string(),
            event_type: EventType::Joined,
            payload: format!("{} joined", identity),
            room_id,
        }
    }

    pub fn left(room_id: RoomId, identity: &str) -> Self {
        Self {
            from: identity.to_string(),
            event_type: EventType::Left,
            payload: format!("{} left", identity),
            room_id,
        }
    }

    pub fn signal(room_id: RoomId, from: &str, signal_type: String, payload: String) -> Self {
        Self {
            from: from.to_string(),
            event_type: EventType::Signal(signal_type),
            payload,
            room_id,
        }
    }
}
