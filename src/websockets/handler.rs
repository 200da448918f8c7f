use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Path, Query, State, WebSocketUpgrade},
    http::HeaderMap,
    response::Response,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::messages::ClientSignalMessage;
use super::socket::{Connection, MessageHandler};
use crate::shared::{AppError, AppState};
use crate::signaling::{SignalingService, Subscription};

/// Header a client may use to name itself when it can't set a query parameter
pub const IDENTITY_HEADER: &str = "x-identity";

/// Query parameters for the WebSocket upgrade
#[derive(Debug, Default, Deserialize)]
pub struct JoinQuery {
    pub identity: Option<String>,
}

/// Relays signal frames sent by a client over its own WebSocket
pub struct WebsocketReceiveHandler {
    signaling: SignalingService,
}

impl WebsocketReceiveHandler {
    pub fn new(signaling: SignalingService) -> Self {
        Self { signaling }
    }
}

#[async_trait]
impl MessageHandler for WebsocketReceiveHandler {
    async fn handle_message(&self, identity: &str, room_id: &str, message: String) {
        debug!(
            identity = %identity,
            room_id = %room_id,
            message = %message,
            "Received message"
        );

        let signal = match serde_json::from_str::<ClientSignalMessage>(&message) {
            Ok(signal) => signal,
            Err(e) => {
                warn!(
                    identity = %identity,
                    room_id = %room_id,
                    error = %e,
                    "Failed to parse WebSocket message"
                );
                return;
            }
        };

        if let Err(e) = self
            .signaling
            .signal(room_id, identity, &signal.signal_type, signal.signal_data)
            .await
        {
            warn!(
                identity = %identity,
                room_id = %room_id,
                error = %e,
                "In-band signal rejected"
            );
        }
    }
}

/// Picks the caller's identity: query parameter, then header, then peer address
pub fn resolve_identity(
    query: &JoinQuery,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) -> Option<String> {
    let explicit = query
        .identity
        .as_deref()
        .map(str::trim)
        .filter(|identity| !identity.is_empty());
    if let Some(identity) = explicit {
        return Some(identity.to_string());
    }

    let from_header = headers
        .get(IDENTITY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|identity| !identity.is_empty());
    if let Some(identity) = from_header {
        return Some(identity.to_string());
    }

    peer.map(|addr| addr.to_string())
}

/// WebSocket endpoint for joining a room
///
/// GET /ws/{room_id}?identity=X
/// The member is registered before the upgrade so join failures come back as
/// plain HTTP errors; the socket then carries the member's event stream.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(query): Query<JoinQuery>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    State(app_state): State<AppState>,
) -> Result<Response, AppError> {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let identity = resolve_identity(&query, &headers, peer).ok_or_else(|| {
        warn!(room_id = %room_id, "No identity supplied and no peer address available");
        AppError::BadRequest("Missing identity".to_string())
    })?;

    info!(
        room_id = %room_id,
        identity = %identity,
        peer = ?peer,
        "WebSocket join requested"
    );

    let subscription = app_state.signaling.join(&room_id, &identity).await?;

    Ok(ws.on_upgrade(move |socket| {
        handle_websocket_connection(socket, subscription, app_state.signaling)
    }))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(
    socket: axum::extract::ws::WebSocket,
    subscription: Subscription,
    signaling: SignalingService,
) {
    let room_id = subscription.room_id().to_string();
    let identity = subscription.identity().to_string();

    info!(
        room_id = %room_id,
        identity = %identity,
        "WebSocket connection established"
    );

    let message_handler = Arc::new(WebsocketReceiveHandler::new(signaling));
    let connection = Connection::new(subscription, Box::new(socket), message_handler);

    match connection.run().await {
        Ok(()) => {
            info!(
                room_id = %room_id,
                identity = %identity,
                "WebSocket connection closed cleanly"
            );
        }
        Err(e) => {
            warn!(
                room_id = %room_id,
                identity = %identity,
                error = %e,
                "WebSocket connection error"
            );
        }
    }
}
