//! Error types for the admin API server.
//!
//! [`AdminError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use starreach_core::{EmpireError, ModifyError, RankError};
use starreach_db::StoreError;

/// Errors that can occur in the admin API layer.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A UUID could not be parsed from the request path.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    /// A star modification failed one of its preconditions.
    #[error("rejected: {0}")]
    Rejected(String),

    /// A concurrent writer got there first; the request may be retried.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AdminError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<ModifyError> for AdminError {
    fn from(err: ModifyError) -> Self {
        match err {
            ModifyError::StarNotFound { star_id } => Self::NotFound(format!("star {star_id}")),
            ModifyError::Rejected(rejection) => Self::Rejected(rejection.to_string()),
            ModifyError::Store(e) => e.into(),
        }
    }
}

impl From<EmpireError> for AdminError {
    fn from(err: EmpireError) -> Self {
        match err {
            EmpireError::InvalidName { reason } => Self::InvalidQuery(reason),
            EmpireError::Store(e) => e.into(),
            EmpireError::Placement(e) => Self::Internal(e.to_string()),
            e @ EmpireError::HomeworldStranded { .. } => Self::Internal(e.to_string()),
        }
    }
}

impl From<RankError> for AdminError {
    fn from(err: RankError) -> Self {
        match err {
            RankError::Store(e) => e.into(),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidQuery(msg) | Self::InvalidUuid(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::Rejected(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %message, "Admin request failed");
        }

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
