use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

/// Structured API error returned to HTTP clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Application-level error type that converts into an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub details: Option<Vec<FieldError>>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn validation(details: Vec<FieldError>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "VALIDATION_ERROR".to_string(),
            message: "Validation failed".to_string(),
            details: Some(details),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorDetail {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Failures of a single signaling request. None of them are fatal to the
/// connection; the relay turns each into a reply (or nothing) for the sender.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("room {0} does not exist")]
    RoomNotFound(String),
    #[error("invalid room id: {0}")]
    InvalidRoomId(&'static str),
    #[error("target {0} is no longer connected")]
    StaleTarget(String),
    #[error("connection is already in room {0}")]
    AlreadyInRoom(String),
    #[error("connection has left its room")]
    SessionClosed,
}

impl RelayError {
    /// Machine-readable code sent in `error` events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RoomNotFound(_) => "ROOM_NOT_FOUND",
            Self::InvalidRoomId(_) => "INVALID_ROOM_ID",
            Self::StaleTarget(_) => "STALE_TARGET",
            Self::AlreadyInRoom(_) => "ALREADY_IN_ROOM",
            Self::SessionClosed => "SESSION_CLOSED",
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::InvalidRoomId(reason) => Self::validation(vec![FieldError {
                field: "room_id".to_string(),
                message: reason.to_string(),
            }]),
            other => Self::bad_request(other.to_string()),
        }
    }
}
