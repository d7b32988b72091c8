//! Room bootstrap endpoints. A page can reserve a room over HTTP, hand the id
//! to its peers, and then let everyone join over the signaling socket.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use signal_common::id::{prefix, prefixed_ulid};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiErrorBody};
use crate::gateway::registry::validate_room_id;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{room_id}", get(get_room))
}

// ---------------------------------------------------------------------------
// POST /api/v1/rooms
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRoomRequest {
    /// Requested room id. A `room_` prefixed ULID is generated when absent.
    pub room_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateRoomResponse {
    pub room_id: String,
    /// False when the room already existed.
    pub created: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/rooms",
    tag = "Rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room reserved (or already reserved)", body = CreateRoomResponse),
        (status = 400, description = "Invalid room id", body = ApiErrorBody),
    ),
)]
pub async fn create_room(
    State(state): State<AppState>,
    Json(body): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), ApiError> {
    let room_id = body
        .room_id
        .unwrap_or_else(|| prefixed_ulid(prefix::ROOM));
    validate_room_id(&room_id)?;

    let created = state.rooms.create(&room_id);
    if created {
        tracing::info!(room_id = %room_id, "room created over http");
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateRoomResponse { room_id, created }),
    ))
}

// ---------------------------------------------------------------------------
// GET /api/v1/rooms/:room_id
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoomInfoResponse {
    pub room_id: String,
    pub exists: bool,
    pub member_count: usize,
}

#[utoipa::path(
    get,
    path = "/api/v1/rooms/{room_id}",
    tag = "Rooms",
    params(
        ("room_id" = String, Path, description = "Room ID"),
    ),
    responses(
        (status = 200, description = "Room status", body = RoomInfoResponse),
    ),
)]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Json<RoomInfoResponse> {
    let members = state.rooms.members(&room_id);
    Json(RoomInfoResponse {
        exists: members.is_some(),
        member_count: members.map_or(0, |m| m.len()),
        room_id,
    })
}
