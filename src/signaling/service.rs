use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::subscription::Subscription;
use super::types::{RoomMemberResponse, RoomSummary, SignalAck};
use crate::config::ServerConfig;
use crate::room::{ConnectionHandle, JoinResult, LeaveOutcome, RoomEvent, RoomId, RoomRegistry};
use crate::shared::AppError;

/// Join / Signal operations on top of the room registry
#[derive(Clone)]
pub struct SignalingService {
    registry: Arc<RoomRegistry>,
    send_timeout: Duration,
    outbound_buffer: usize,
}

impl SignalingService {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            registry: Arc::new(RoomRegistry::new(config.room_capacity)),
            send_timeout: config.send_timeout,
            outbound_buffer: config.outbound_buffer,
        }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Joins `identity` to the room, creating the room if needed
    ///
    /// The returned subscription yields every event broadcast to this member
    /// from now on; earlier room history is not replayed.
    #[instrument(skip(self))]
    pub async fn join(&self, room_id: &str, identity: &str) -> Result<Subscription, AppError> {
        let room_id = RoomId::parse(room_id)?;
        if identity.trim().is_empty() {
            return Err(AppError::BadRequest("Identity must not be empty".to_string()));
        }

        loop {
            let room = self.registry.get_or_create(&room_id).await;
            let (handle, receiver) = ConnectionHandle::channel(self.outbound_buffer, self.send_timeout);
            let connection_id = handle.id();

            match room.join(identity, handle).await {
                JoinResult::Success { replaced } => {
                    info!(
                        room_id = %room_id,
                        identity = %identity,
                        connection_id = %connection_id,
                        replaced,
                        "Join accepted"
                    );
                    return Ok(Subscription::new(
                        Arc::clone(&self.registry),
                        room_id,
                        identity.to_string(),
                        connection_id,
                        receiver,
                    ));
                }
                JoinResult::RoomFull => {
                    warn!(room_id = %room_id, identity = %identity, "Join rejected, room is full");
                    return Err(AppError::RoomFull(room_id.to_string()));
                }
                JoinResult::RoomClosed => {
                    debug!(room_id = %room_id, "Room closed during join, retrying");
                }
            }
        }
    }

    /// Relays a signal to every member of the room except the sender
    ///
    /// Returns once the event is queued for the current members; it does not
    /// wait for clients to read it.
    #[instrument(skip(self, payload))]
    pub async fn signal(
        &self,
        room_id: &str,
        from: &str,
        signal_type: &str,
        payload: String,
    ) -> Result<SignalAck, AppError> {
        let room_id = RoomId::parse(room_id)?;
        if from.trim().is_empty() {
            return Err(AppError::BadRequest("Sender must not be empty".to_string()));
        }
        if signal_type.trim().is_empty() {
            return Err(AppError::BadRequest("Signal type must not be empty".to_string()));
        }

        let room = match self.registry.get(&room_id).await {
            Some(room) if !room.is_empty().await => room,
            _ => {
                debug!(room_id = %room_id, "Signal into room with no members");
                return Err(AppError::RoomNotFound(room_id.to_string()));
            }
        };

        let event = RoomEvent::signal(room_id.clone(), from, signal_type.to_string(), payload);
        let report = room.broadcast(&event, Some(from)).await;

        if !report.pruned.is_empty() {
            self.registry.drop_if_empty(&room_id).await;
        }

        debug!(
            room_id = %room_id,
            from = %from,
            signal_type = %signal_type,
            delivered = report.delivered,
            pruned = report.pruned.len(),
            "Signal relayed"
        );

        Ok(SignalAck {
            delivered: report.delivered,
        })
    }

    /// Removes a member explicitly; a no-op if it is not in the room
    #[instrument(skip(self))]
    pub async fn leave(&self, room_id: &str, identity: &str) -> Result<LeaveOutcome, AppError> {
        let room_id = RoomId::parse(room_id)?;
        Ok(self.registry.leave(&room_id, identity).await)
    }

    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        let mut summaries = Vec::new();
        for room in self.registry.list_rooms().await {
            summaries.push(RoomSummary {
                room_id: room.id().to_string(),
                member_count: room.member_count().await,
            });
        }
        summaries.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        summaries
    }

    /// Members of one room, oldest first
    pub async fn room_members(&self, room_id: &str) -> Result<Vec<RoomMemberResponse>, AppError> {
        let room_id = RoomId::parse(room_id)?;
        let room = self
            .registry
            .get(&room_id)
            .await
            .ok_or_else(|| AppError::RoomNotFound(room_id.to_string()))?;

        let mut members: Vec<RoomMemberResponse> = room
            .members()
            .await
            .into_iter()
            .map(|member| RoomMemberResponse {
                identity: member.identity,
                joined_at: member.joined_at,
            })
            .collect();
        members.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.identity.cmp(&b.identity))
        });
        Ok(members)
    }

    /// Ends every member stream and forgets every room
    pub async fn shutdown(&self) {
        let evicted = self.registry.close_all().await;
        info!(evicted, "Signaling service shut down");
    }
}
