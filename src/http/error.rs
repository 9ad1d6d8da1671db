//! Error responses for the HTTP adapter.
//!
//! Every failure renders as `{"message": ..., "time": ...}` with a stable
//! message. The underlying cause is logged, never sent to the client.

use crate::error::StoreError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, warn};

pub const MSG_INVALID_JSON: &str = "invalid JSON";
pub const MSG_INVALID_ID: &str = "invalid id";
pub const MSG_COMPLETE_MUST_BE_TRUE: &str = "complete must be true";
pub const MSG_BODY_UNREADABLE: &str = "could not read request body";
pub const MSG_NOT_FOUND: &str = "task not found";
pub const MSG_NO_ROUTE: &str = "route not found";
pub const MSG_METHOD_NOT_ALLOWED: &str = "method not allowed";
pub const MSG_TIMEOUT: &str = "request timed out";
pub const MSG_CANCELED: &str = "request canceled";
pub const MSG_DB_ERROR: &str = "database error";
pub const MSG_SAVE_ERROR: &str = "could not save task";
pub const MSG_UPDATE_ERROR: &str = "could not update task";
pub const MSG_DELETE_ERROR: &str = "could not delete task";
pub const MSG_SELECT_ERROR: &str = "could not fetch task";

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub time: DateTime<Utc>,
}

/// A failed request: status, client-facing message, and the logged cause.
#[derive(Debug)]
pub struct ApiError {
    pub op: &'static str,
    pub status: StatusCode,
    pub message: String,
    pub cause: Option<String>,
}

impl ApiError {
    pub fn new(op: &'static str, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            op,
            status,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    // Convenience constructors

    pub fn bad_request(op: &'static str, message: impl Into<String>) -> Self {
        Self::new(op, StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(op: &'static str) -> Self {
        Self::new(op, StatusCode::NOT_FOUND, MSG_NOT_FOUND)
    }

    pub fn timeout(op: &'static str) -> Self {
        Self::new(op, StatusCode::SERVICE_UNAVAILABLE, MSG_TIMEOUT)
    }

    /// Map a store failure. `storage_message` is the client message for
    /// anything that is not a missing task or a cancellation.
    pub fn from_store(op: &'static str, err: StoreError, storage_message: &'static str) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::not_found(op).with_cause(err),
            StoreError::Canceled => {
                Self::new(op, StatusCode::SERVICE_UNAVAILABLE, MSG_CANCELED).with_cause(err)
            }
            other => Self::new(op, StatusCode::INTERNAL_SERVER_ERROR, storage_message)
                .with_cause(other),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            message: self.message.clone(),
            time: Utc::now(),
        }
    }

    fn log(&self) {
        let cause = self.cause.as_deref().unwrap_or("");
        if self.status.is_server_error() {
            error!(
                op = self.op,
                status = self.status.as_u16(),
                message = %self.message,
                error = cause,
                "request failed"
            );
        } else {
            warn!(
                op = self.op,
                status = self.status.as_u16(),
                message = %self.message,
                error = cause,
                "request failed"
            );
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.op, self.message, self.status)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        (self.status, Json(self.body())).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        let op = "test";
        let not_found = ApiError::from_store(op, StoreError::NotFound { id: 3 }, MSG_DB_ERROR);
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.message, MSG_NOT_FOUND);

        let canceled = ApiError::from_store(op, StoreError::Canceled, MSG_DB_ERROR);
        assert_eq!(canceled.status, StatusCode::SERVICE_UNAVAILABLE);

        let storage = ApiError::from_store(
            op,
            StoreError::Corrupt {
                id: 1,
                reason: "bad".to_string(),
            },
            MSG_SAVE_ERROR,
        );
        assert_eq!(storage.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(storage.message, MSG_SAVE_ERROR);
        assert!(storage.cause.unwrap().contains("corrupt"));
    }

    #[test]
    fn body_never_includes_cause() {
        let err = ApiError::bad_request("op", MSG_INVALID_JSON).with_cause("expected `,` at line 1");
        let json = serde_json::to_value(err.body()).unwrap();
        assert_eq!(json["message"], MSG_INVALID_JSON);
        assert!(json["time"].is_string());
        assert_eq!(json.as_object().unwrap().len(), 2);
    }
}
