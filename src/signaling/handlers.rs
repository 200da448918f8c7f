use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::types::{RoomMemberResponse, RoomSummary, SignalRequest, SignalResponse};
use crate::shared::{AppError, AppState};

/// HTTP handler for relaying a signal
///
/// POST /rooms/{room_id}/signal
/// Answers as soon as the signal is queued for the room's current members
#[instrument(name = "send_signal", skip(state, request))]
pub async fn send_signal(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<SignalRequest>,
) -> Result<Json<SignalResponse>, AppError> {
    let ack = state
        .signaling
        .signal(
            &room_id,
            &request.from_user,
            &request.signal_type,
            request.signal_data,
        )
        .await?;

    info!(
        room_id = %room_id,
        from_user = %request.from_user,
        signal_type = %request.signal_type,
        delivered = ack.delivered,
        "Signal dispatched"
    );

    Ok(Json(SignalResponse::ok()))
}

/// HTTP handler for listing live rooms
///
/// GET /rooms
#[instrument(name = "list_rooms", skip(state))]
pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSummary>> {
    let rooms = state.signaling.list_rooms().await;
    info!(room_count = rooms.len(), "Rooms listed");
    Json(rooms)
}

/// GET /rooms/{room_id}/members
#[instrument(name = "room_members", skip(state))]
pub async fn room_members(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<RoomMemberResponse>>, AppError> {
    Ok(Json(state.signaling.room_members(&room_id).await?))
}

pub async fn health() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::EventType;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/rooms", get(list_rooms))
            .route("/rooms/:room_id/members", get(room_members))
            .route("/rooms/:room_id/signal", post(send_signal))
            .with_state(state)
    }

    fn signal_request(room_id: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/rooms/{}/signal", room_id))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_send_signal_handler() {
        let app_state = AppStateBuilder::new().build();
        let mut alice = app_state.signaling.join("r1", "alice").await.unwrap();

        let request = signal_request(
            "r1",
            r#"{"fromUser": "bob", "signalType": "offer", "signalData": "sdp"}"#,
        );
        let response = app(app_state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: SignalResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(body, SignalResponse::ok());

        let event = alice.recv().await.unwrap();
        assert_eq!(event.from, "bob");
        assert_eq!(event.event_type, EventType::Signal("offer".to_string()));
        assert_eq!(event.payload, "sdp");
    }

    #[tokio::test]
    async fn test_send_signal_to_empty_room_is_not_found() {
        let app_state = AppStateBuilder::new().build();

        let request = signal_request(
            "ghost",
            r#"{"fromUser": "bob", "signalType": "offer", "signalData": "sdp"}"#,
        );
        let response = app(app_state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Room not found: ghost");
    }

    #[tokio::test]
    async fn test_send_signal_missing_sender_is_bad_request() {
        let app_state = AppStateBuilder::new().build();
        let _alice = app_state.signaling.join("r1", "alice").await.unwrap();

        let request = signal_request(
            "r1",
            r#"{"fromUser": "", "signalType": "offer", "signalData": "sdp"}"#,
        );
        let response = app(app_state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_send_signal_invalid_json() {
        let app_state = AppStateBuilder::new().build();

        let request = signal_request("r1", r#"{"fromUser": "bob""#);
        let response = app(app_state).oneshot(request).await.unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_list_rooms_handler() {
        let app_state = AppStateBuilder::new().build();
        let _alice = app_state.signaling.join("r1", "alice").await.unwrap();
        let _bob = app_state.signaling.join("r1", "bob").await.unwrap();

        let request = Request::builder()
            .uri("/rooms")
            .body(Body::empty())
            .unwrap();
        let response = app(app_state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let rooms: Vec<RoomSummary> = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(
            rooms,
            vec![RoomSummary {
                room_id: "r1".to_string(),
                member_count: 2,
            }]
        );
    }

    #[tokio::test]
    async fn test_room_members_handler() {
        let app_state = AppStateBuilder::new().build();
        let _alice = app_state.signaling.join("r1", "alice").await.unwrap();

        let request = Request::builder()
            .uri("/rooms/r1/members")
            .body(Body::empty())
            .unwrap();
        let response = app(app_state.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let members: Vec<RoomMemberResponse> =
            serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].identity, "alice");

        let request = Request::builder()
            .uri("/rooms/ghost/members")
            .body(Body::empty())
            .unwrap();
        let response = app(app_state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
