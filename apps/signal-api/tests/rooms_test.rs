mod common;

use axum::body::Body;
use axum::http::StatusCode;
use axum_test::TestServer;
use http::Request;
use signal_api::gateway::session::ConnectionId;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_ok() {
    let (app, _state) = common::test_app();

    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// POST /api/v1/rooms
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_room_with_requested_id() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .post("/api/v1/rooms")
        .json(&serde_json::json!({ "room_id": "standup" }))
        .await;

    resp.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["room_id"], "standup");
    assert_eq!(body["created"], true);
    assert!(state.rooms.exists("standup"));
}

#[tokio::test]
async fn create_room_generates_id_when_absent() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server.post("/api/v1/rooms").json(&serde_json::json!({})).await;

    resp.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = resp.json();
    let room_id = body["room_id"].as_str().unwrap();
    assert!(room_id.starts_with("room_"));
    assert!(state.rooms.exists(room_id));
}

#[tokio::test]
async fn create_existing_room_is_not_an_error() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();
    state.rooms.create("standup");

    let resp = server
        .post("/api/v1/rooms")
        .json(&serde_json::json!({ "room_id": "standup" }))
        .await;

    resp.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["room_id"], "standup");
    assert_eq!(body["created"], false);
    assert_eq!(state.rooms.room_count(), 1);
}

#[tokio::test]
async fn create_room_rejects_blank_id() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .post("/api/v1/rooms")
        .json(&serde_json::json!({ "room_id": "   " }))
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"][0]["field"], "room_id");
    assert_eq!(state.rooms.room_count(), 0);
}

// ---------------------------------------------------------------------------
// GET /api/v1/rooms/:room_id
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_room_reports_members() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();
    state.rooms.create("standup");
    state
        .rooms
        .join("standup", &ConnectionId::from("cn_one"))
        .unwrap();

    let resp = server.get("/api/v1/rooms/standup").await;

    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["room_id"], "standup");
    assert_eq!(body["exists"], true);
    assert_eq!(body["member_count"], 1);
}

#[tokio::test]
async fn get_unknown_room_reports_absent() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server.get("/api/v1/rooms/nowhere").await;

    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["exists"], false);
    assert_eq!(body["member_count"], 0);
}
