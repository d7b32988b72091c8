//! Signaling relay: turns one inbound event from one session into registry
//! updates and deliveries.
//!
//! Join, departure, and video notices go to the member list the registry
//! returned, never to the transport's room groups, so a peer is told about
//! exactly the membership changes that happened after its own join.

use std::sync::Arc;

use crate::error::RelayError;

use super::events::{
    ClientEvent, DescriptionPayload, IceCandidatePayload, NotePayload, ServerEvent,
};
use super::fanout::Transport;
use super::registry::{validate_room_id, Departure, RoomRegistry};
use super::session::{ConnectionId, GatewaySession};

pub struct SignalingRelay {
    rooms: Arc<RoomRegistry>,
    transport: Arc<dyn Transport>,
}

impl SignalingRelay {
    pub fn new(rooms: Arc<RoomRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self { rooms, transport }
    }

    /// Handle one inbound event. Failures are reported to the sender (or
    /// dropped, for stale targets) and never end the connection.
    pub fn handle(&self, session: &mut GatewaySession, event: ClientEvent) {
        let name = event.name();
        let result = match event {
            ClientEvent::CheckRoom(p) => {
                let exists = self.rooms.exists(&p.room_id);
                self.reply(session, ServerEvent::RoomExists { exists });
                Ok(())
            }
            ClientEvent::CreateRoom(p) => self.create_room(session, p.room_id),
            ClientEvent::JoinRoom(p) => self.join_room(session, &p.room_id),
            ClientEvent::LeaveRoom(_) => {
                self.leave_room(session);
                Ok(())
            }
            ClientEvent::Offer(DescriptionPayload { target, sdp }) => {
                let caller = session.id.clone();
                self.forward(&target, ServerEvent::Offer { sdp, caller })
            }
            ClientEvent::Answer(DescriptionPayload { target, sdp }) => {
                let caller = session.id.clone();
                self.forward(&target, ServerEvent::Answer { sdp, caller })
            }
            ClientEvent::IceCandidate(IceCandidatePayload { target, candidate }) => {
                let from = session.id.clone();
                self.forward(&target, ServerEvent::IceCandidate { candidate, from })
            }
            ClientEvent::VideoStateChange(p) => {
                self.video_state_change(session, p.enabled);
                Ok(())
            }
            ClientEvent::NoteMessage(NotePayload { room_id, payload }) => {
                let event = ServerEvent::RemoteNoteMessage {
                    user_id: session.id.clone(),
                    payload,
                };
                self.transport.broadcast(&room_id, &event, &session.id);
                Ok(())
            }
        };

        if let Err(err) = result {
            self.report(session, name, err);
        }
    }

    /// Transport-level disconnect. Safe to call more than once.
    pub fn disconnect(&self, session: &mut GatewaySession) {
        if session.mark_disconnected() {
            self.cleanup(&session.id);
        }
    }

    fn create_room(&self, session: &GatewaySession, room_id: String) -> Result<(), RelayError> {
        validate_room_id(&room_id)?;
        if self.rooms.create(&room_id) {
            tracing::info!(conn_id = %session.id, room_id = %room_id, "room created");
        }
        self.reply(session, ServerEvent::RoomCreated { room_id });
        Ok(())
    }

    fn join_room(&self, session: &mut GatewaySession, room_id: &str) -> Result<(), RelayError> {
        if session.is_terminal() {
            return Err(RelayError::SessionClosed);
        }

        let transport = &self.transport;
        let conn_id = &session.id;
        let snapshot = self.rooms.join_with(room_id, conn_id, |snapshot| {
            transport.send(
                conn_id,
                &ServerEvent::AllUsers {
                    ids: snapshot.others.clone(),
                },
            );
            transport.send(
                conn_id,
                &ServerEvent::InitialVideoStates(snapshot.video_states.clone()),
            );
        })?;
        let first_join = session.room_id().is_none();
        session.mark_joined(room_id);
        self.transport.subscribe(&session.id, room_id);

        tracing::info!(
            conn_id = %session.id,
            room_id = %room_id,
            others = snapshot.others.len(),
            "joined room"
        );

        if first_join {
            self.transport.send_many(
                &snapshot.others,
                &ServerEvent::UserJoined {
                    id: session.id.clone(),
                },
                &session.id,
            );
        }
        Ok(())
    }

    fn leave_room(&self, session: &mut GatewaySession) {
        if session.mark_left().is_some() {
            self.cleanup(&session.id);
        }
    }

    fn video_state_change(&self, session: &GatewaySession, enabled: bool) {
        let Some(room_id) = session.room_id() else {
            tracing::debug!(conn_id = %session.id, "video state change outside a room");
            return;
        };
        let Some(others) = self.rooms.set_video_state(room_id, &session.id, enabled) else {
            return;
        };
        self.transport.send_many(
            &others,
            &ServerEvent::RemoteVideoStateChange {
                user_id: session.id.clone(),
                enabled,
            },
            &session.id,
        );
    }

    fn forward(&self, target: &ConnectionId, event: ServerEvent) -> Result<(), RelayError> {
        if self.transport.send(target, &event) {
            Ok(())
        } else {
            Err(RelayError::StaleTarget(target.to_string()))
        }
    }

    /// Remove the connection from its room and tell whoever is left.
    fn cleanup(&self, conn_id: &ConnectionId) {
        for Departure { room_id, remaining } in self.rooms.leave(conn_id) {
            self.transport.unsubscribe(conn_id, &room_id);
            tracing::info!(
                conn_id = %conn_id,
                room_id = %room_id,
                remaining = remaining.len(),
                "left room"
            );
            if !remaining.is_empty() {
                self.transport.send_many(
                    &remaining,
                    &ServerEvent::UserDisconnected {
                        id: conn_id.clone(),
                    },
                    conn_id,
                );
            }
        }
    }

    fn reply(&self, session: &GatewaySession, event: ServerEvent) {
        self.transport.send(&session.id, &event);
    }

    fn report(&self, session: &GatewaySession, event_name: &str, err: RelayError) {
        match err {
            RelayError::StaleTarget(target) => {
                tracing::debug!(conn_id = %session.id, %target, event = event_name, "target gone, dropped");
            }
            RelayError::RoomNotFound(room_id) => {
                tracing::debug!(conn_id = %session.id, room_id = %room_id, "join for unknown room");
                self.reply(session, ServerEvent::RoomNotFound {});
            }
            other => {
                tracing::debug!(conn_id = %session.id, event = event_name, error = %other, "request rejected");
                self.reply(session, ServerEvent::error(other.code(), other.to_string()));
            }
        }
    }
}
