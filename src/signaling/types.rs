use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request payload for relaying a signal into a room
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRequest {
    pub from_user: String,
    pub signal_type: String,
    #[serde(default)]
    pub signal_data: String,
}

/// Response for a relayed signal
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SignalResponse {
    pub status: String,
}

impl SignalResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Result of dispatching a signal to a room's members
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalAck {
    /// Members the signal was queued for
    pub delivered: usize,
}

/// One entry of the room listing
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: String,
    pub member_count: usize,
}

/// One member of a room
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomMemberResponse {
    pub identity: String,
    pub joined_at: DateTime<Utc>,
}
