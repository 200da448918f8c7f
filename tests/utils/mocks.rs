use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

use signal_relay::websockets::{RoomEventMessage, SocketError, SocketWrapper};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Server side of an in-memory socket
pub struct MockSocket {
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: mpsc::UnboundedSender<String>,
}

/// Client side of an in-memory socket
pub struct MockClient {
    to_server: Option<mpsc::UnboundedSender<String>>,
    from_server: Option<mpsc::UnboundedReceiver<String>>,
}

impl MockSocket {
    pub fn pair() -> (MockSocket, MockClient) {
        let (to_server, inbound) = mpsc::unbounded_channel();
        let (outbound, from_server) = mpsc::unbounded_channel();
        (
            MockSocket { inbound, outbound },
            MockClient {
                to_server: Some(to_server),
                from_server: Some(from_server),
            },
        )
    }
}

#[async_trait]
impl SocketWrapper for MockSocket {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        self.outbound
            .send(message)
            .map_err(|_| SocketError::ConnectionClosed)
    }

    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        Ok(self.inbound.recv().await)
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        Ok(())
    }
}

#[allow(dead_code)]
impl MockClient {
    pub fn send(&self, frame: &str) {
        self.to_server
            .as_ref()
            .expect("client already disconnected")
            .send(frame.to_string())
            .expect("server side gone");
    }

    pub fn send_signal(&self, signal_type: &str, signal_data: &str) {
        let frame = serde_json::json!({"signalType": signal_type, "signalData": signal_data});
        self.send(&frame.to_string());
    }

    /// Next frame from the server, parsed; `None` on timeout or closed socket
    pub async fn next_event(&mut self) -> Option<RoomEventMessage> {
        let receiver = self.from_server.as_mut()?;
        let frame = tokio::time::timeout(Duration::from_secs(1), receiver.recv())
            .await
            .ok()??;
        Some(serde_json::from_str(&frame).expect("server sent invalid frame"))
    }

    /// Closes the client -> server direction, like a client hanging up
    pub fn disconnect(&mut self) {
        self.to_server = None;
    }

    /// Stops reading, so the server's next write fails
    pub fn stop_reading(&mut self) {
        self.from_server = None;
    }
}
