// Public API - what other modules can use
pub use handlers::{health, list_rooms, room_members, send_signal};
pub use service::SignalingService;
pub use subscription::Subscription;
pub use types::{RoomMemberResponse, RoomSummary, SignalAck, SignalRequest, SignalResponse};

// Internal modules
mod handlers;
mod service;
mod subscription;
mod types;
