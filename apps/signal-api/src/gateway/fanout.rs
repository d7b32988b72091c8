//! Delivery of gateway events to connected peers.
//!
//! Each connection registers an unbounded channel with the [`ConnectionHub`]
//! and its socket task drains it. Multi-recipient deliveries serialize once
//! and push the same frame into each channel, so a peer sees events in the
//! order they were sent to it.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use super::events::ServerEvent;
use super::session::ConnectionId;

/// A serialized frame, shared between every recipient of a broadcast.
pub type Frame = Arc<str>;

/// What the signaling relay needs from the connection layer.
pub trait Transport: Send + Sync {
    /// Best-effort unicast. Returns false if `conn_id` is not connected.
    fn send(&self, conn_id: &ConnectionId, event: &ServerEvent) -> bool;

    /// Unicast the same event to each of `conn_ids`, skipping `exclude`.
    /// Returns the number of connections it was queued for.
    fn send_many(&self, conn_ids: &[ConnectionId], event: &ServerEvent, exclude: &ConnectionId) -> usize {
        conn_ids
            .iter()
            .filter(|c| *c != exclude)
            .filter(|c| self.send(c, event))
            .count()
    }

    /// Deliver to every subscriber of `room_id` except `exclude`.
    /// Returns the number of connections the frame was queued for.
    fn broadcast(&self, room_id: &str, event: &ServerEvent, exclude: &ConnectionId) -> usize;

    fn subscribe(&self, conn_id: &ConnectionId, room_id: &str);

    fn unsubscribe(&self, conn_id: &ConnectionId, room_id: &str);
}

/// In-process transport over per-connection channels.
#[derive(Default)]
pub struct ConnectionHub {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<Frame>>,
    groups: DashMap<String, HashSet<ConnectionId>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. The returned receiver yields every frame
    /// addressed to it until [`ConnectionHub::disconnect`] is called.
    pub fn connect(&self, conn_id: ConnectionId) -> mpsc::UnboundedReceiver<Frame> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.insert(conn_id, tx);
        rx
    }

    /// Forget a connection and drop it from every group.
    pub fn disconnect(&self, conn_id: &ConnectionId) {
        self.connections.remove(conn_id);
        self.groups.retain(|_, members| {
            members.remove(conn_id);
            !members.is_empty()
        });
    }

    pub fn is_connected(&self, conn_id: &ConnectionId) -> bool {
        self.connections.contains_key(conn_id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    fn encode(event: &ServerEvent) -> Option<Frame> {
        match event.to_json() {
            Ok(text) => Some(text.into()),
            Err(err) => {
                tracing::error!(?err, ?event, "failed to serialize gateway event");
                None
            }
        }
    }

    fn push(&self, conn_id: &ConnectionId, frame: &Frame) -> bool {
        match self.connections.get(conn_id) {
            // A closed receiver means the socket task is already gone.
            Some(tx) => tx.send(frame.clone()).is_ok(),
            None => false,
        }
    }
}

impl Transport for ConnectionHub {
    fn send(&self, conn_id: &ConnectionId, event: &ServerEvent) -> bool {
        match Self::encode(event) {
            Some(frame) => self.push(conn_id, &frame),
            None => false,
        }
    }

    fn send_many(&self, conn_ids: &[ConnectionId], event: &ServerEvent, exclude: &ConnectionId) -> usize {
        if conn_ids.iter().all(|c| c == exclude) {
            return 0;
        }
        let Some(frame) = Self::encode(event) else {
            return 0;
        };
        conn_ids
            .iter()
            .filter(|c| *c != exclude)
            .filter(|c| self.push(c, &frame))
            .count()
    }

    fn broadcast(&self, room_id: &str, event: &ServerEvent, exclude: &ConnectionId) -> usize {
        // Copy the member list out so no shard lock is held while sending.
        let members: Vec<ConnectionId> = match self.groups.get(room_id) {
            Some(group) => group.iter().filter(|m| *m != exclude).cloned().collect(),
            None => return 0,
        };
        if members.is_empty() {
            return 0;
        }

        let Some(frame) = Self::encode(event) else {
            return 0;
        };
        members.iter().filter(|m| self.push(m, &frame)).count()
    }

    fn subscribe(&self, conn_id: &ConnectionId, room_id: &str) {
        self.groups
            .entry(room_id.to_string())
            .or_default()
            .insert(conn_id.clone());
    }

    fn unsubscribe(&self, conn_id: &ConnectionId, room_id: &str) {
        let emptied = match self.groups.get_mut(room_id) {
            Some(mut group) => {
                group.remove(conn_id);
                group.is_empty()
            }
            None => false,
        };
        if emptied {
            self.groups.remove_if(room_id, |_, members| members.is_empty());
        }
    }
}
