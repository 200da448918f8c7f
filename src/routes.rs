use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::shared::AppState;
use crate::signaling::{health, list_rooms, room_members, send_signal};
use crate::websockets::websocket_handler;

/// Builds the HTTP/WebSocket surface of the relay
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rooms", get(list_rooms))
        .route("/rooms/:room_id/members", get(room_members))
        .route("/rooms/:room_id/signal", post(send_signal))
        .route("/ws/:room_id", get(websocket_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
