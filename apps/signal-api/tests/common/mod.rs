#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use signal_api::config::Config;
use signal_api::AppState;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a test waits for a frame before giving up.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Build a test AppState with default configuration.
pub fn test_state() -> AppState {
    AppState::new(Config::default())
}

/// Build the full application router wired to the test state.
pub fn test_app() -> (Router, AppState) {
    test_app_with(Config::default())
}

pub fn test_app_with(config: Config) -> (Router, AppState) {
    let state = AppState::new(config);
    let app = signal_api::routes::router().with_state(state.clone());
    (app, state)
}

/// Start an actual TCP server for WebSocket testing.
/// Returns (addr, state). The server runs in the background.
pub async fn start_ws_server() -> (SocketAddr, AppState) {
    start_ws_server_with(Config::default()).await
}

/// Like [`start_ws_server`], with custom settings (e.g. a short heartbeat).
pub async fn start_ws_server_with(config: Config) -> (SocketAddr, AppState) {
    let (app, state) = test_app_with(config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

/// Connect to the signaling socket and consume the `welcome` frame.
/// Returns the stream and the connection id the server assigned.
pub async fn connect_peer(addr: SocketAddr) -> (WsClient, String) {
    let url = format!("ws://{addr}/signal");
    let (mut ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");

    let welcome = next_event(&mut ws).await;
    assert_eq!(welcome["event"], "welcome");
    let id = welcome["data"]["id"]
        .as_str()
        .expect("welcome carries id")
        .to_string();
    (ws, id)
}

/// Send one `{"event", "data"}` frame.
pub async fn send_event(ws: &mut WsClient, event: &str, data: Value) {
    let frame = serde_json::json!({ "event": event, "data": data });
    ws.send(tungstenite::Message::Text(frame.to_string().into()))
        .await
        .expect("send event");
}

/// Read the next text frame as JSON, skipping control frames.
pub async fn next_event(ws: &mut WsClient) -> Value {
    loop {
        let msg = time::timeout(READ_TIMEOUT, ws.next())
            .await
            .expect("timeout waiting for event")
            .expect("stream ended")
            .expect("ws read error");

        match msg {
            tungstenite::Message::Text(text) => {
                return serde_json::from_str(&text).expect("parse event");
            }
            tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_) => continue,
            other => panic!("Expected text frame, got: {other:?}"),
        }
    }
}

/// Assert that no text frame arrives within `wait`.
pub async fn assert_silent(ws: &mut WsClient, wait: Duration) {
    let deadline = time::Instant::now() + wait;
    loop {
        match time::timeout_at(deadline, ws.next()).await {
            Err(_) => return,
            Ok(Some(Ok(tungstenite::Message::Text(text)))) => {
                panic!("expected silence, got: {text}");
            }
            Ok(Some(Ok(_))) => continue,
            Ok(other) => panic!("stream ended unexpectedly: {other:?}"),
        }
    }
}
