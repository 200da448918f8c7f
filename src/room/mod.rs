// Room membership and fan-out
//
// A Room owns its members and their outbound handles; the RoomRegistry maps
// room ids to rooms and drops rooms once they are empty.

// Public API - what other modules can use
pub use connection::{ConnectionHandle, ConnectionId, DeliveryError};
pub use models::{DeliveryReport, JoinResult, LeaveOutcome, Member, Room};
pub use registry::RoomRegistry;
pub use types::{EventType, Identity, RoomEvent, RoomId};

// Internal modules
mod connection;
mod models;
mod registry;
mod types;
