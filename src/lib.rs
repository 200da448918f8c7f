// Library crate for the signaling relay
// This file exposes the public API for the binary and integration tests

pub mod config;
pub mod room;
pub mod routes;
pub mod shared;
pub mod signaling;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use config::ServerConfig;
pub use room::{EventType, RoomEvent, RoomId, RoomRegistry};
pub use routes::router;
pub use shared::{AppError, AppState};
pub use signaling::{SignalingService, Subscription};
pub use websockets::{Connection, MessageHandler, SocketWrapper, WebsocketReceiveHandler};
