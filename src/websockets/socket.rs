use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use super::messages::RoomEventMessage;
use crate::signaling::Subscription;

/// Simple WebSocket abstraction - all we care about is send/receive
#[async_trait]
pub trait SocketWrapper: Send {
    /// Send a text message to the client
    async fn send_message(&mut self, message: String) -> Result<(), SocketError>;

    /// Receive the next text message from the client (None if connection closed)
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), SocketError>;
}

/// Handler for incoming WebSocket messages
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle an incoming message from the client
    async fn handle_message(&self, identity: &str, room_id: &str, message: String);
}

#[derive(Error, Debug)]
pub enum SocketError {
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
}

/// Direct implementation on axum's WebSocket
#[async_trait]
impl SocketWrapper for WebSocket {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        self.send(Message::Text(message))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        loop {
            match self.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Close(_))) => return Ok(None),
                // Ping/pong are answered by axum; binary frames carry nothing we relay
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(SocketError::ReceiveFailed(e.to_string())),
                None => return Ok(None),
            }
        }
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.send(Message::Close(None))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }
}

/// Connection pairs one client socket with its room subscription
///
/// Room events from the subscription are written to the socket; text frames
/// from the client go to the message handler. The subscription is released
/// whichever side ends first.
pub struct Connection {
    subscription: Subscription,
    socket: Box<dyn SocketWrapper>,
    message_handler: Arc<dyn MessageHandler>,
}

impl Connection {
    pub fn new(
        subscription: Subscription,
        socket: Box<dyn SocketWrapper>,
        message_handler: Arc<dyn MessageHandler>,
    ) -> Self {
        Self {
            subscription,
            socket,
            message_handler,
        }
    }

    /// Run the connection until either side goes away, then leave the room
    pub async fn run(self) -> Result<(), SocketError> {
        let Connection {
            mut subscription,
            mut socket,
            message_handler,
        } = self;

        let outcome = pump(&mut subscription, socket.as_mut(), message_handler.as_ref()).await;

        let _ = socket.close().await;
        let leave = subscription.leave().await;
        debug!(outcome = ?outcome, leave = ?leave, "Connection finished");

        outcome
    }
}

async fn pump(
    subscription: &mut Subscription,
    socket: &mut dyn SocketWrapper,
    message_handler: &dyn MessageHandler,
) -> Result<(), SocketError> {
    let identity = subscription.identity().to_string();
    let room_id = subscription.room_id().to_string();

    loop {
        tokio::select! {
            biased;

            // Handle outbound events (from the room to the client)
            event = subscription.recv() => {
                let Some(event) = event else {
                    // Replaced by a newer join, pruned, or shut down
                    debug!(room_id = %room_id, identity = %identity, "Subscription ended");
                    return Ok(());
                };
                let frame = serde_json::to_string(&RoomEventMessage::from(&event))
                    .map_err(|e| SocketError::SendFailed(e.to_string()))?;
                socket.send_message(frame).await?;
            }

            // Handle inbound messages (from the client to the room)
            message = socket.receive_message() => {
                match message {
                    Ok(Some(message)) => {
                        message_handler
                            .handle_message(&identity, &room_id, message)
                            .await;
                    }
                    Ok(None) => return Ok(()), // Client disconnected
                    Err(e) => {
                        warn!(room_id = %room_id, identity = %identity, error = %e, "Receive failed");
                        return Err(e);
                    }
                }
            }
        }
    }
}
