use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::SendTimeoutError};
use uuid::Uuid;

use super::types::RoomEvent;

/// Unique id of one outbound stream
///
/// Two joins with the same identity get different connection ids, so cleanup
/// of a replaced stream can tell itself apart from its replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single delivery attempt failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Outbound queue stayed full for the whole send timeout
    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),

    /// Receiving side of the stream is gone
    #[error("Outbound stream closed")]
    Closed,
}

/// Sending half of one member's outbound event stream
///
/// Events queue on a bounded channel drained by the member's connection task,
/// so events pushed through one handle arrive in the order they were pushed.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::Sender<RoomEvent>,
    send_timeout: Duration,
}

impl ConnectionHandle {
    /// Creates a handle and the receiver its events will arrive on
    pub fn channel(buffer: usize, send_timeout: Duration) -> (Self, mpsc::Receiver<RoomEvent>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let handle = Self {
            id: ConnectionId::new(),
            sender,
            send_timeout,
        };
        (handle, receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Pushes one event, waiting at most the send timeout for queue space
    pub async fn deliver(&self, event: RoomEvent) -> Result<(), DeliveryError> {
        self.sender
            .send_timeout(event, self.send_timeout)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => DeliveryError::Timeout(self.send_timeout),
                SendTimeoutError::Closed(_) => DeliveryError::Closed,
            })
    }
}
