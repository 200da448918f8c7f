use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use super::connection::ConnectionId;
use super::models::{LeaveOutcome, Room};
use super::types::RoomId;

/// In-memory index of live rooms
///
/// Rooms are created on first join and dropped once empty. The registry lock
/// only guards the room map itself; work inside a room takes that room's lock.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, Arc<Room>>>,
    room_capacity: Option<usize>,
}

impl RoomRegistry {
    pub fn new(room_capacity: Option<usize>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            room_capacity,
        }
    }

    /// Returns the room, creating it if needed
    ///
    /// Concurrent callers for the same unseen id all get the same instance.
    pub async fn get_or_create(&self, room_id: &RoomId) -> Arc<Room> {
        if let Some(room) = self.rooms.read().await.get(room_id) {
            return Arc::clone(room);
        }

        let mut rooms = self.rooms.write().await;
        let room = rooms.entry(room_id.clone()).or_insert_with(|| {
            debug!(room_id = %room_id, "Creating room");
            Arc::new(Room::new(room_id.clone(), self.room_capacity))
        });
        Arc::clone(room)
    }

    pub async fn get(&self, room_id: &RoomId) -> Option<Arc<Room>> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Removes the room iff it has no members
    ///
    /// The room is closed under its own lock before removal, so a join that
    /// already resolved this room sees `RoomClosed` instead of landing in a
    /// room nobody can reach.
    #[instrument(skip(self))]
    pub async fn drop_if_empty(&self, room_id: &RoomId) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get(room_id) else {
            return false;
        };
        if !room.close_if_empty().await {
            return false;
        }

        rooms.remove(room_id);
        info!(room_id = %room_id, "Dropped empty room");
        true
    }

    /// Removes a member from its room and drops the room if that emptied it
    pub async fn leave(&self, room_id: &RoomId, identity: &str) -> LeaveOutcome {
        let Some(room) = self.get(room_id).await else {
            return LeaveOutcome::NotMember;
        };
        let outcome = room.leave(identity).await;
        self.drop_if_vacated(room_id, &outcome).await;
        outcome
    }

    /// Like [`RoomRegistry::leave`], but only if the member is still on this stream
    pub async fn leave_connection(
        &self,
        room_id: &RoomId,
        identity: &str,
        connection_id: ConnectionId,
    ) -> LeaveOutcome {
        let Some(room) = self.get(room_id).await else {
            return LeaveOutcome::NotMember;
        };
        let outcome = room.leave_connection(identity, connection_id).await;
        self.drop_if_vacated(room_id, &outcome).await;
        outcome
    }

    async fn drop_if_vacated(&self, room_id: &RoomId, outcome: &LeaveOutcome) {
        if let LeaveOutcome::Left { room_empty: true } = outcome {
            self.drop_if_empty(room_id).await;
        }
    }

    pub async fn list_rooms(&self) -> Vec<Arc<Room>> {
        self.rooms.read().await.values().cloned().collect()
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Closes every room, ending every member stream
    pub async fn close_all(&self) -> usize {
        let rooms: Vec<Arc<Room>> = self.rooms.write().await.drain().map(|(_, room)| room).collect();

        let mut evicted = 0;
        for room in rooms {
            evicted += room.close().await;
        }
        info!(evicted, "Closed all rooms");
        evicted
    }
}
