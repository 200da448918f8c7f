use serde::{Deserialize, Serialize};

use crate::room::RoomEvent;

/// Server -> client frame, one per room event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomEventMessage {
    pub user_id: String,
    /// "joined", "left" or the application's signal type
    pub event_type: String,
    pub payload: String,
}

impl From<&RoomEvent> for RoomEventMessage {
    fn from(event: &RoomEvent) -> Self {
        Self {
            user_id: event.from.clone(),
            event_type: event.event_type.as_str().to_string(),
            payload: event.payload.clone(),
        }
    }
}

/// Client -> server frame: a signal relayed from the sending connection's identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClientSignalMessage {
    pub signal_type: String,
    #[serde(default)]
    pub signal_data: String,
}
