//! WebSocket upgrade handler and per-connection event loop.

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use signal_common::PrefixedId;
use tokio::sync::mpsc;
use tokio::time;

use crate::AppState;

use super::events::{ClientEvent, ServerEvent};
use super::fanout::{Frame, Transport};
use super::session::{ConnectionId, GatewaySession};

/// Close codes (4000-range for application-level).
const CLOSE_SESSION_TIMEOUT: u16 = 4009;

pub fn router() -> Router<AppState> {
    Router::new().route("/signal", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let (ws_tx, ws_rx) = socket.split();

    let mut session = GatewaySession::new(ConnectionId::generate());
    let outbound_rx = state.hub.connect(session.id.clone());

    tracing::info!(conn_id = %session.id, "signaling connection opened");

    state.hub.send(
        &session.id,
        &ServerEvent::Welcome {
            id: session.id.clone(),
        },
    );

    run_session(&state, &mut session, ws_tx, ws_rx, outbound_rx).await;

    state.relay.disconnect(&mut session);
    state.hub.disconnect(&session.id);

    tracing::info!(conn_id = %session.id, "signaling connection closed");
}

/// Main session loop: decode client events, forward queued frames, enforce
/// heartbeat.
async fn run_session(
    state: &AppState,
    session: &mut GatewaySession,
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut ws_rx: SplitStream<WebSocket>,
    mut outbound_rx: mpsc::UnboundedReceiver<Frame>,
) {
    let interval = state.config.heartbeat_interval;
    let mut heartbeat_timer = time::interval(interval);
    heartbeat_timer.tick().await; // First tick fires immediately; skip it.
    let mut got_activity = true;

    loop {
        tokio::select! {
            // Client sends us a message.
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        got_activity = true;
                        match ClientEvent::from_json(&text) {
                            Ok(event) => state.relay.handle(session, event),
                            Err(e) => {
                                tracing::debug!(conn_id = %session.id, error = %e, "undecodable frame");
                                state.hub.send(
                                    &session.id,
                                    &ServerEvent::error("INVALID_MESSAGE", e.to_string()),
                                );
                            }
                        }
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        got_activity = true;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(?e, conn_id = %session.id, "ws read error");
                        break;
                    }
                    Some(Ok(Message::Binary(_))) => continue,
                }
            }

            // Frame queued for this connection by the relay.
            frame = outbound_rx.recv() => {
                let Some(frame) = frame else { break };
                if ws_tx.send(Message::Text(frame.to_string().into())).await.is_err() {
                    break;
                }
            }

            // Heartbeat: ping, and give up on peers that went quiet.
            _ = heartbeat_timer.tick() => {
                if !got_activity {
                    tracing::warn!(conn_id = %session.id, "heartbeat timeout, closing connection");
                    let _ = send_close(&mut ws_tx, CLOSE_SESSION_TIMEOUT, "Heartbeat timeout").await;
                    break;
                }
                got_activity = false;
                if ws_tx.send(Message::Ping(Default::default())).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Send a WebSocket close frame with a code and reason.
async fn send_close(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    code: u16,
    reason: &str,
) -> Result<(), axum::Error> {
    let close_msg = Message::Close(Some(CloseFrame {
        code,
        reason: reason.to_string().into(),
    }));
    ws_tx.send(close_msg).await
}
