use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use signal_relay::{
    websockets::SocketError, Connection, RoomId, ServerConfig, SignalingService, Subscription,
    WebsocketReceiveHandler,
};

use super::mocks::{MockClient, MockSocket};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub service: SignalingService,
}

pub struct TestSetupBuilder {
    config: ServerConfig,
}

#[allow(dead_code)]
impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig {
                send_timeout: Duration::from_millis(50),
                ..ServerConfig::default()
            },
        }
    }

    pub fn with_outbound_buffer(mut self, buffer: usize) -> Self {
        self.config.outbound_buffer = buffer;
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.config.send_timeout = timeout;
        self
    }

    pub fn build(self) -> TestSetup {
        TestSetup {
            service: SignalingService::new(&self.config),
        }
    }
}

#[allow(dead_code)]
impl TestSetup {
    pub async fn join(&self, room_id: &str, identity: &str) -> Subscription {
        self.service
            .join(room_id, identity)
            .await
            .expect("join should succeed")
    }

    pub async fn signal(&self, room_id: &str, from: &str, signal_type: &str, payload: &str) -> usize {
        self.service
            .signal(room_id, from, signal_type, payload.to_string())
            .await
            .expect("signal should succeed")
            .delivered
    }

    pub async fn member_count(&self, room_id: &str) -> usize {
        let room_id = RoomId::parse(room_id).unwrap();
        match self.service.registry().get(&room_id).await {
            Some(room) => room.member_count().await,
            None => 0,
        }
    }

    pub async fn room_exists(&self, room_id: &str) -> bool {
        let room_id = RoomId::parse(room_id).unwrap();
        self.service.registry().get(&room_id).await.is_some()
    }

    /// Joins and runs a connection over a mock socket in the background
    pub async fn connect(
        &self,
        room_id: &str,
        identity: &str,
    ) -> (MockClient, JoinHandle<Result<(), SocketError>>) {
        let subscription = self.join(room_id, identity).await;
        let (socket, client) = MockSocket::pair();
        let handler = Arc::new(WebsocketReceiveHandler::new(self.service.clone()));
        let connection = Connection::new(subscription, Box::new(socket), handler);
        (client, tokio::spawn(connection.run()))
    }
}
