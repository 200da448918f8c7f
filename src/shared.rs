use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::signaling::SignalingService;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub signaling: SignalingService,
}

impl AppState {
    pub fn new(signaling: SignalingService) -> Self {
        Self { signaling }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Room is full: {0}")]
    RoomFull(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::RoomNotFound(room_id) => {
                (StatusCode::NOT_FOUND, format!("Room not found: {}", room_id))
            }
            AppError::RoomFull(room_id) => (StatusCode::CONFLICT, format!("Room is full: {}", room_id)),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
