use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Storage temporarily unavailable: {0}")]
    StorageBusy(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::StorageBusy(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {msg}"),
            ),
            AppError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({ "error": error_message }))).into_response()
    }
}

impl From<crate::db::Error> for AppError {
    fn from(err: crate::db::Error) -> Self {
        match err {
            // Pool acquisition timed out behind the writer: transient, retryable.
            crate::db::Error::Pool(e) => AppError::StorageBusy(e.to_string()),
            other => AppError::DatabaseError(other.to_string()),
        }
    }
}
