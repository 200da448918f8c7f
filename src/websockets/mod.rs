// Public API
pub use handler::{resolve_identity, websocket_handler, JoinQuery, WebsocketReceiveHandler, IDENTITY_HEADER};
pub use messages::{ClientSignalMessage, RoomEventMessage};
pub use socket::{Connection, MessageHandler, SocketError, SocketWrapper};

// Internal modules
mod handler;
mod messages;
mod socket;
