use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::room::{ConnectionId, Identity, LeaveOutcome, RoomEvent, RoomId, RoomRegistry};

/// Everything needed to take one stream back out of its room
struct Release {
    registry: Arc<RoomRegistry>,
    room_id: RoomId,
    identity: Identity,
    connection_id: ConnectionId,
}

impl Release {
    async fn run(self) -> LeaveOutcome {
        let outcome = self
            .registry
            .leave_connection(&self.room_id, &self.identity, self.connection_id)
            .await;
        debug!(
            room_id = %self.room_id,
            identity = %self.identity,
            connection_id = %self.connection_id,
            outcome = ?outcome,
            "Released membership"
        );
        outcome
    }
}

/// A member's live event stream
///
/// Holding a `Subscription` is holding a seat in the room. The seat is given
/// back exactly once: by [`Subscription::leave`], or on drop if that never ran.
/// The stream ends when the member is replaced by a newer join with the same
/// identity, pruned, or the server shuts down.
pub struct Subscription {
    room_id: RoomId,
    identity: Identity,
    connection_id: ConnectionId,
    receiver: mpsc::Receiver<RoomEvent>,
    release: Option<Release>,
}

impl Subscription {
    pub(crate) fn new(
        registry: Arc<RoomRegistry>,
        room_id: RoomId,
        identity: Identity,
        connection_id: ConnectionId,
        receiver: mpsc::Receiver<RoomEvent>,
    ) -> Self {
        let release = Release {
            registry,
            room_id: room_id.clone(),
            identity: identity.clone(),
            connection_id,
        };
        Self {
            room_id,
            identity,
            connection_id,
            receiver,
            release: Some(release),
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Waits for the next event; `None` once the stream has ended
    pub async fn recv(&mut self) -> Option<RoomEvent> {
        self.receiver.recv().await
    }

    /// Returns an already queued event without waiting
    pub fn try_recv(&mut self) -> Option<RoomEvent> {
        self.receiver.try_recv().ok()
    }

    /// Leaves the room now instead of on drop
    pub async fn leave(mut self) -> LeaveOutcome {
        match self.release.take() {
            Some(release) => release.run().await,
            None => LeaveOutcome::NotMember,
        }
    }
}

impl Stream for Subscription {
    type Item = RoomEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(release) = self.release.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    release.run().await;
                });
            }
            Err(_) => {
                warn!(
                    room_id = %self.room_id,
                    identity = %self.identity,
                    "Subscription dropped outside a runtime, membership not released"
                );
            }
        }
    }
}
