//! Gateway wire-format messages.
//!
//! Every frame is a JSON text message of the form
//! `{"event": "<kebab-case name>", "data": { ... }}`. Inbound frames are
//! decoded once into [`ClientEvent`]; outbound frames are built from
//! [`ServerEvent`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::session::ConnectionId;

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// A message received from a peer over WebSocket.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    CheckRoom(RoomPayload),
    CreateRoom(RoomPayload),
    JoinRoom(RoomPayload),
    /// Accepts `{}`, `null`, or no `data` at all.
    LeaveRoom(Option<EmptyPayload>),
    Offer(DescriptionPayload),
    Answer(DescriptionPayload),
    IceCandidate(IceCandidatePayload),
    VideoStateChange(VideoStatePayload),
    NoteMessage(NotePayload),
}

impl ClientEvent {
    /// Decode a text frame.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CheckRoom(_) => "check-room",
            Self::CreateRoom(_) => "create-room",
            Self::JoinRoom(_) => "join-room",
            Self::LeaveRoom(_) => "leave-room",
            Self::Offer(_) => "offer",
            Self::Answer(_) => "answer",
            Self::IceCandidate(_) => "ice-candidate",
            Self::VideoStateChange(_) => "video-state-change",
            Self::NoteMessage(_) => "note-message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    pub room_id: String,
}

/// `data` for events that carry nothing. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EmptyPayload {}

/// SDP offer or answer addressed to one peer. `sdp` is opaque.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DescriptionPayload {
    pub target: ConnectionId,
    pub sdp: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IceCandidatePayload {
    pub target: ConnectionId,
    pub candidate: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoStatePayload {
    pub enabled: bool,
}

/// Transient note event for everyone else in a room. Never stored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePayload {
    pub room_id: String,
    #[serde(default)]
    pub payload: Value,
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// A message sent from the server to a peer over WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// First frame on every connection: the peer's own routing address.
    Welcome { id: ConnectionId },
    RoomExists { exists: bool },
    RoomCreated {
        #[serde(rename = "roomId")]
        room_id: String,
    },
    RoomNotFound {},
    AllUsers { ids: Vec<ConnectionId> },
    /// Data is the bare `{ connId: enabled }` map.
    InitialVideoStates(HashMap<ConnectionId, bool>),
    UserJoined { id: ConnectionId },
    Offer { sdp: Value, caller: ConnectionId },
    Answer { sdp: Value, caller: ConnectionId },
    IceCandidate { candidate: Value, from: ConnectionId },
    RemoteVideoStateChange {
        #[serde(rename = "userId")]
        user_id: ConnectionId,
        enabled: bool,
    },
    RemoteNoteMessage {
        #[serde(rename = "userId")]
        user_id: ConnectionId,
        payload: Value,
    },
    UserDisconnected { id: ConnectionId },
    Error { code: String, message: String },
}

impl ServerEvent {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Serialize to the JSON text sent on the wire.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
