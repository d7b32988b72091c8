//! Per-connection gateway session state.

use std::fmt;

use serde::{Deserialize, Serialize};
use signal_common::id::{prefix, PrefixedId};

/// Unique connection identifier (`cn_` prefixed ULID). Doubles as the
/// routing address peers use as `target` in point-to-point messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PrefixedId for ConnectionId {
    const PREFIX: &'static str = prefix::CONNECTION;

    fn from_raw(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for ConnectionId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a connection stands with respect to rooms.
///
/// `Unjoined -> Joined -> (Left | Disconnected)`. The last two are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomState {
    Unjoined,
    Joined(String),
    Left,
    Disconnected,
}

/// State for a single WebSocket connection. Owned by the connection task.
#[derive(Debug)]
pub struct GatewaySession {
    /// Unique connection identifier.
    pub id: ConnectionId,
    state: RoomState,
}

impl GatewaySession {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            state: RoomState::Unjoined,
        }
    }

    pub fn state(&self) -> &RoomState {
        &self.state
    }

    /// The room this connection is currently in, if any.
    pub fn room_id(&self) -> Option<&str> {
        match &self.state {
            RoomState::Joined(room_id) => Some(room_id),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, RoomState::Left | RoomState::Disconnected)
    }

    /// Record a successful join. Re-joining the same room is a no-op.
    pub fn mark_joined(&mut self, room_id: &str) {
        if self.state == RoomState::Unjoined {
            self.state = RoomState::Joined(room_id.to_string());
        }
    }

    /// Move from `Joined` to `Left`, returning the room to clean up. Any
    /// other state is left untouched, so a stray leave before joining does
    /// not close the session.
    pub fn mark_left(&mut self) -> Option<String> {
        match self.state {
            RoomState::Joined(_) => self.terminate(RoomState::Left),
            _ => None,
        }
    }

    /// Move to `Disconnected`. Returns true the first time a connection
    /// reaches a terminal state, so cleanup runs exactly once.
    pub fn mark_disconnected(&mut self) -> bool {
        match self.state {
            RoomState::Disconnected | RoomState::Left => {
                self.state = RoomState::Disconnected;
                false
            }
            _ => {
                self.terminate(RoomState::Disconnected);
                true
            }
        }
    }

    fn terminate(&mut self, next: RoomState) -> Option<String> {
        if self.is_terminal() {
            return None;
        }
        match std::mem::replace(&mut self.state, next) {
            RoomState::Joined(room_id) => Some(room_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GatewaySession {
        GatewaySession::new(ConnectionId::from("cn_a"))
    }

    #[test]
    fn generated_ids_are_prefixed() {
        let id = ConnectionId::generate();
        assert!(signal_common::id::has_prefix(id.as_str(), prefix::CONNECTION));
    }

    #[test]
    fn starts_unjoined() {
        let s = session();
        assert_eq!(s.state(), &RoomState::Unjoined);
        assert!(s.room_id().is_none());
    }

    #[test]
    fn join_then_leave() {
        let mut s = session();
        s.mark_joined("abc");
        assert_eq!(s.room_id(), Some("abc"));

        assert_eq!(s.mark_left(), Some("abc".to_string()));
        assert_eq!(s.state(), &RoomState::Left);
        assert!(s.room_id().is_none());

        // Left is terminal: a second leave has nothing to clean up.
        assert_eq!(s.mark_left(), None);
    }

    #[test]
    fn leave_before_join_keeps_session_open() {
        let mut s = session();
        assert_eq!(s.mark_left(), None);
        assert_eq!(s.state(), &RoomState::Unjoined);

        s.mark_joined("abc");
        assert_eq!(s.room_id(), Some("abc"));
    }

    #[test]
    fn join_is_ignored_once_terminal() {
        let mut s = session();
        s.mark_joined("abc");
        s.mark_left();
        s.mark_joined("xyz");
        assert_eq!(s.state(), &RoomState::Left);
    }

    #[test]
    fn disconnect_cleans_up_once() {
        let mut s = session();
        s.mark_joined("abc");
        assert!(s.mark_disconnected());
        assert!(!s.mark_disconnected());
        assert_eq!(s.state(), &RoomState::Disconnected);
    }

    #[test]
    fn disconnect_after_leave_does_not_clean_up_again() {
        let mut s = session();
        s.mark_joined("abc");
        s.mark_left();
        assert!(!s.mark_disconnected());
        assert_eq!(s.state(), &RoomState::Disconnected);
    }
}
