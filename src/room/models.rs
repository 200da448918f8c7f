use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::connection::{ConnectionHandle, ConnectionId, DeliveryError};
use super::types::{Identity, RoomEvent, RoomId};

/// One participant's live connection inside a room
#[derive(Debug, Clone)]
pub struct Member {
    pub identity: Identity,
    pub handle: ConnectionHandle,
    pub joined_at: DateTime<Utc>,
}

/// Result of attempting to join a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinResult {
    /// Member registered; `replaced` is true when an older stream with the
    /// same identity was evicted
    Success { replaced: bool },
    /// Room is at its configured capacity
    RoomFull,
    /// Room was removed from the registry before the join got in
    RoomClosed,
}

/// Result of removing a member
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Member removed and a Left event broadcast
    Left { room_empty: bool },
    /// Nothing to do - already gone, or the identity now belongs to a newer stream
    NotMember,
}

/// Outcome of one broadcast, including any pruning it caused
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Members the original event was queued for
    pub delivered: usize,
    /// Members removed because a delivery to them failed
    pub pruned: Vec<Identity>,
}

#[derive(Debug, Default)]
struct RoomState {
    members: HashMap<Identity, Member>,
    closed: bool,
}

struct Recipient {
    identity: Identity,
    handle: ConnectionHandle,
}

struct FanOut {
    delivered: usize,
    failures: Vec<(Identity, ConnectionId, DeliveryError)>,
}

/// Members of one room, keyed by identity
///
/// Structural changes take the write lock. Broadcasts only hold the read lock
/// long enough to copy the current handles, then deliver without any lock, so
/// concurrent broadcasts never serialize against each other.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    capacity: Option<usize>,
    state: RwLock<RoomState>,
}

impl Room {
    pub fn new(id: RoomId, capacity: Option<usize>) -> Self {
        Self {
            id,
            capacity,
            state: RwLock::new(RoomState::default()),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Registers a member, replacing any existing stream with the same identity
    ///
    /// The replaced handle is dropped without a Left event. Every other member
    /// gets a Joined event; the joiner does not.
    pub async fn join(&self, identity: &str, handle: ConnectionHandle) -> JoinResult {
        let connection_id = handle.id();
        let replaced = {
            let mut state = self.state.write().await;
            if state.closed {
                return JoinResult::RoomClosed;
            }

            let replacing = state.members.contains_key(identity);
            if let Some(capacity) = self.capacity {
                if !replacing && state.members.len() >= capacity {
                    debug!(room_id = %self.id, identity = %identity, capacity, "Room is full");
                    return JoinResult::RoomFull;
                }
            }

            let member = Member {
                identity: identity.to_string(),
                handle,
                joined_at: Utc::now(),
            };
            state.members.insert(identity.to_string(), member).is_some()
        };

        info!(
            room_id = %self.id,
            identity = %identity,
            connection_id = %connection_id,
            replaced,
            "Member joined room"
        );

        self.broadcast(&RoomEvent::joined(self.id.clone(), identity), Some(identity))
            .await;

        JoinResult::Success { replaced }
    }

    /// Removes the member with this identity, whichever stream it is on
    ///
    /// Idempotent: a second call finds nothing and broadcasts nothing.
    pub async fn leave(&self, identity: &str) -> LeaveOutcome {
        self.leave_matching(identity, None).await
    }

    /// Removes the member only if it is still on the given stream
    pub async fn leave_connection(&self, identity: &str, connection_id: ConnectionId) -> LeaveOutcome {
        self.leave_matching(identity, Some(connection_id)).await
    }

    async fn leave_matching(&self, identity: &str, connection_id: Option<ConnectionId>) -> LeaveOutcome {
        if self.remove_member(identity, connection_id).await.is_none() {
            return LeaveOutcome::NotMember;
        }

        info!(room_id = %self.id, identity = %identity, "Member left room");

        self.broadcast(&RoomEvent::left(self.id.clone(), identity), None)
            .await;

        LeaveOutcome::Left {
            room_empty: self.is_empty().await,
        }
    }

    /// Fans an event out to a snapshot of the members, except `exclude`
    ///
    /// Never fails as a whole. Members whose delivery fails are removed
    /// together and the rest of the room is told they left; those Left events
    /// can expose further broken members, which are pruned the same way. Each
    /// round waits at most one send timeout per recipient.
    pub async fn broadcast(&self, event: &RoomEvent, exclude: Option<&str>) -> DeliveryReport {
        let fan_out = self.fan_out(std::slice::from_ref(event), exclude).await;
        let mut report = DeliveryReport {
            delivered: fan_out.delivered,
            pruned: Vec::new(),
        };

        let mut failures = fan_out.failures;
        while !failures.is_empty() {
            let pruned = self.prune(failures).await;
            if pruned.is_empty() {
                break;
            }

            let lefts: Vec<RoomEvent> = pruned
                .iter()
                .map(|identity| RoomEvent::left(self.id.clone(), identity))
                .collect();
            failures = self.fan_out(&lefts, None).await.failures;
            report.pruned.extend(pruned);
        }

        report
    }

    /// Delivers `events` in order to each recipient, all recipients at once
    ///
    /// A recipient's first failed delivery ends its turn, so one bad
    /// recipient costs at most one send timeout.
    async fn fan_out(&self, events: &[RoomEvent], exclude: Option<&str>) -> FanOut {
        let recipients = self.snapshot(exclude).await;

        debug!(
            room_id = %self.id,
            events = events.len(),
            recipients = recipients.len(),
            "Broadcasting room events"
        );

        let attempts = recipients.into_iter().map(|recipient| async move {
            for event in events {
                if let Err(error) = recipient.handle.deliver(event.clone()).await {
                    return (recipient, Err(error));
                }
            }
            (recipient, Ok(()))
        });

        let mut fan_out = FanOut {
            delivered: 0,
            failures: Vec::new(),
        };
        for (recipient, result) in join_all(attempts).await {
            match result {
                Ok(()) => fan_out.delivered += 1,
                Err(error) => {
                    debug!(
                        room_id = %self.id,
                        identity = %recipient.identity,
                        error = %error,
                        "Delivery failed"
                    );
                    fan_out
                        .failures
                        .push((recipient.identity, recipient.handle.id(), error));
                }
            }
        }
        fan_out
    }

    /// Removes every failed member still on the stream that failed, under one
    /// write lock, and returns who was actually removed
    async fn prune(&self, failures: Vec<(Identity, ConnectionId, DeliveryError)>) -> Vec<Identity> {
        let mut state = self.state.write().await;
        let mut pruned = Vec::new();
        for (identity, connection_id, error) in failures {
            let on_failed_stream = state
                .members
                .get(&identity)
                .is_some_and(|member| member.handle.id() == connection_id);
            if !on_failed_stream {
                continue;
            }

            state.members.remove(&identity);
            warn!(
                room_id = %self.id,
                identity = %identity,
                error = %error,
                "Pruned member after failed delivery"
            );
            pruned.push(identity);
        }
        pruned
    }

    async fn snapshot(&self, exclude: Option<&str>) -> Vec<Recipient> {
        let state = self.state.read().await;
        state
            .members
            .values()
            .filter(|member| Some(member.identity.as_str()) != exclude)
            .map(|member| Recipient {
                identity: member.identity.clone(),
                handle: member.handle.clone(),
            })
            .collect()
    }

    async fn remove_member(&self, identity: &str, connection_id: Option<ConnectionId>) -> Option<Member> {
        let mut state = self.state.write().await;
        let current = state.members.get(identity)?;
        if let Some(connection_id) = connection_id {
            if current.handle.id() != connection_id {
                return None;
            }
        }
        state.members.remove(identity)
    }

    /// Marks the room closed if it has no members
    ///
    /// A closed room refuses joins, so the registry can drop it without racing
    /// a join that already holds a reference to it.
    pub(crate) async fn close_if_empty(&self) -> bool {
        let mut state = self.state.write().await;
        if state.members.is_empty() {
            state.closed = true;
        }
        state.closed
    }

    /// Closes the room and drops every member handle, ending their streams
    pub(crate) async fn close(&self) -> usize {
        let mut state = self.state.write().await;
        state.closed = true;
        let evicted = state.members.len();
        state.members.clear();
        evicted
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.members.is_empty()
    }

    pub async fn member_count(&self) -> usize {
        self.state.read().await.members.len()
    }

    pub async fn has_member(&self, identity: &str) -> bool {
        self.state.read().await.members.contains_key(identity)
    }

    pub async fn members(&self) -> Vec<Member> {
        self.state.read().await.members.values().cloned().collect()
    }
}
