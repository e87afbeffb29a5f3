use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use mealhub_sdk::{ErrorKind, HubError};

/// A write request refused before it reached the hub.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRequest {
    pub error: String,
    pub missing: Vec<String>,
    /// Whether the request was recorded in the rejection log.
    pub queue_logged: bool,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Hub(#[from] HubError),

    #[error("{}", .0.error)]
    Rejected(RejectedRequest),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// HTTP status reported for each hub failure kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::AlreadyExistsRace => StatusCode::CONFLICT,
        ErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::ObjectUploadFailed => StatusCode::BAD_GATEWAY,
        ErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            Self::Hub(err) => {
                let status = status_for(err.kind());
                let body = json!({
                    "error": err.to_string(),
                    "kind": err.kind(),
                    "operation": err.operation(),
                });
                (status, Json(body)).into_response()
            }
            Self::Rejected(rejected) => (StatusCode::BAD_REQUEST, Json(rejected)).into_response(),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": other.to_string() })),
            )
                .into_response(),
        }
    }
}
