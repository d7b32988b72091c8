//! Room registry: which connections are in which room, and their video flags.
//!
//! Everything lives in one struct behind one `parking_lot::Mutex`, so a join's
//! snapshot and insertion (or a leave's removal and room deletion) is a single
//! critical section. Nothing here awaits. The only delivery made under the
//! lock is the joiner's own snapshot reply, queued through `join_with`.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::RelayError;

use super::session::ConnectionId;

/// Longest room id accepted from clients, in characters.
pub const MAX_ROOM_ID_LEN: usize = 128;

/// Reject empty, oversized, or control-character room ids.
pub fn validate_room_id(room_id: &str) -> Result<(), RelayError> {
    if room_id.trim().is_empty() {
        return Err(RelayError::InvalidRoomId("room id must not be empty"));
    }
    if room_id.chars().count() > MAX_ROOM_ID_LEN {
        return Err(RelayError::InvalidRoomId("room id is too long"));
    }
    if room_id.chars().any(char::is_control) {
        return Err(RelayError::InvalidRoomId(
            "room id must not contain control characters",
        ));
    }
    Ok(())
}

struct Room {
    /// Insertion ordered.
    members: Vec<ConnectionId>,
    /// Keys are always a subset of `members`.
    video: HashMap<ConnectionId, bool>,
    created_at: Instant,
}

impl Room {
    fn new() -> Self {
        Self {
            members: Vec::new(),
            video: HashMap::new(),
            created_at: Instant::now(),
        }
    }

    fn remove(&mut self, conn_id: &ConnectionId) {
        self.members.retain(|m| m != conn_id);
        self.video.remove(conn_id);
    }
}

#[derive(Default)]
struct Rooms {
    by_id: HashMap<String, Room>,
    /// Reverse index: which room each connection is in.
    membership: HashMap<ConnectionId, String>,
}

/// What a joining connection learns about the room it just entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSnapshot {
    /// Everyone else in the room, in join order.
    pub others: Vec<ConnectionId>,
    /// Video flags of `others`.
    pub video_states: HashMap<ConnectionId, bool>,
}

/// A room a connection was removed from, with whoever is still in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: String,
    pub remaining: Vec<ConnectionId>,
}

/// Shared registry of all rooms.
pub struct RoomRegistry {
    inner: Mutex<Rooms>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Rooms::default()),
        }
    }

    pub fn exists(&self, room_id: &str) -> bool {
        self.inner.lock().by_id.contains_key(room_id)
    }

    /// Reserve a room id. Returns true if the room was newly created;
    /// creating an existing room is a no-op.
    pub fn create(&self, room_id: &str) -> bool {
        let mut rooms = self.inner.lock();
        if rooms.by_id.contains_key(room_id) {
            return false;
        }
        rooms.by_id.insert(room_id.to_string(), Room::new());
        true
    }

    /// Add `conn_id` to an existing room and snapshot everyone else.
    ///
    /// Joining the room the connection is already in returns a fresh snapshot
    /// without duplicating membership. A connection in some other room gets
    /// `AlreadyInRoom`.
    pub fn join(&self, room_id: &str, conn_id: &ConnectionId) -> Result<JoinSnapshot, RelayError> {
        self.join_with(room_id, conn_id, |_| {})
    }

    /// Like [`RoomRegistry::join`], but runs `on_joined` before the lock is
    /// released, so anything it queues for the joiner lands ahead of a
    /// departure that removes one of `others` after this join.
    /// `on_joined` must not block or call back into the registry.
    pub fn join_with<F>(
        &self,
        room_id: &str,
        conn_id: &ConnectionId,
        on_joined: F,
    ) -> Result<JoinSnapshot, RelayError>
    where
        F: FnOnce(&JoinSnapshot),
    {
        let mut guard = self.inner.lock();
        let rooms = &mut *guard;

        if let Some(current) = rooms.membership.get(conn_id) {
            if current != room_id {
                return Err(RelayError::AlreadyInRoom(current.clone()));
            }
        }

        let room = rooms
            .by_id
            .get_mut(room_id)
            .ok_or_else(|| RelayError::RoomNotFound(room_id.to_string()))?;

        let others: Vec<ConnectionId> = room
            .members
            .iter()
            .filter(|m| *m != conn_id)
            .cloned()
            .collect();
        let video_states = others
            .iter()
            .filter_map(|m| room.video.get(m).map(|enabled| (m.clone(), *enabled)))
            .collect();

        if !room.members.contains(conn_id) {
            room.members.push(conn_id.clone());
            room.video.insert(conn_id.clone(), true);
            rooms.membership.insert(conn_id.clone(), room_id.to_string());
        }

        let snapshot = JoinSnapshot {
            others,
            video_states,
        };
        on_joined(&snapshot);
        Ok(snapshot)
    }

    /// Overwrite a member's video flag and return the other members to tell.
    /// Returns `None` (and changes nothing) if the room or member is gone.
    pub fn set_video_state(
        &self,
        room_id: &str,
        conn_id: &ConnectionId,
        enabled: bool,
    ) -> Option<Vec<ConnectionId>> {
        let mut rooms = self.inner.lock();
        let room = rooms.by_id.get_mut(room_id)?;
        *room.video.get_mut(conn_id)? = enabled;
        Some(
            room.members
                .iter()
                .filter(|m| *m != conn_id)
                .cloned()
                .collect(),
        )
    }

    /// Remove `conn_id` from whatever room it is in, deleting the room if it
    /// empties. Unknown or already-removed connections are a no-op.
    pub fn leave(&self, conn_id: &ConnectionId) -> Vec<Departure> {
        let mut guard = self.inner.lock();
        let rooms = &mut *guard;

        let Some(room_id) = rooms.membership.remove(conn_id) else {
            return Vec::new();
        };
        let Some(room) = rooms.by_id.get_mut(&room_id) else {
            return Vec::new();
        };

        room.remove(conn_id);
        let remaining = room.members.clone();
        if remaining.is_empty() {
            rooms.by_id.remove(&room_id);
            tracing::info!(room_id = %room_id, "room closed");
        }

        vec![Departure { room_id, remaining }]
    }

    /// Drop reserved rooms that have stayed empty for longer than `ttl`.
    /// Returns the number of rooms removed.
    pub fn sweep_unjoined(&self, ttl: Duration) -> usize {
        self.sweep_unjoined_at(Instant::now(), ttl)
    }

    fn sweep_unjoined_at(&self, now: Instant, ttl: Duration) -> usize {
        let mut rooms = self.inner.lock();
        let before = rooms.by_id.len();
        rooms
            .by_id
            .retain(|_, room| !room.members.is_empty() || now.duration_since(room.created_at) < ttl);
        before - rooms.by_id.len()
    }

    /// Current members of a room, in join order.
    pub fn members(&self, room_id: &str) -> Option<Vec<ConnectionId>> {
        self.inner.lock().by_id.get(room_id).map(|r| r.members.clone())
    }

    pub fn video_state(&self, room_id: &str, conn_id: &ConnectionId) -> Option<bool> {
        self.inner
            .lock()
            .by_id
            .get(room_id)
            .and_then(|r| r.video.get(conn_id).copied())
    }

    /// The room a connection is currently a member of.
    pub fn room_of(&self, conn_id: &ConnectionId) -> Option<String> {
        self.inner.lock().membership.get(conn_id).cloned()
    }

    pub fn room_count(&self) -> usize {
        self.inner.lock().by_id.len()
    }
}
