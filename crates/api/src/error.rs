//! Unified error handling for the order service.
//!
//! The taxonomy follows the request/response contract: `NotFound` (404),
//! `Validation` and `Policy` (400), `Transient` (503, safe to retry) and
//! `Database`/`Internal` (500, details hidden from clients). Every error
//! renders as the JSON envelope `{"status": false, "error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;

/// Postgres error codes that indicate a retryable lock/serialization failure.
const TRANSIENT_PG_CODES: [&str; 3] = [
    "40001", // serialization_failure
    "40P01", // deadlock_detected
    "55P03", // lock_not_available
];

/// Application-level error type for the order service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource absent or not owned by the caller.
    #[error("{0}")]
    NotFound(String),

    /// Malformed input (missing fields, unparsable quantities).
    #[error("{0}")]
    Validation(String),

    /// Input was well-formed but the operation is not permitted:
    /// illegal state transition, inactive shop, insufficient stock,
    /// empty basket.
    #[error("{0}")]
    Policy(String),

    /// Missing or invalid credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Lock/timeout failure; the caller may retry.
    #[error("{0}")]
    Transient(String),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(RepositoryError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        if let RepositoryError::Database(sqlx::Error::Database(db_err)) = &err {
            if let Some(code) = db_err.code() {
                if TRANSIENT_PG_CODES.contains(&code.as_ref()) {
                    return Self::Transient(
                        "operation timed out waiting for inventory locks, please retry"
                            .to_string(),
                    );
                }
            }
        }
        Self::Database(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Database(err).into()
    }
}

impl ApiError {
    /// HTTP status this error maps to.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::Policy(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Server errors go to Sentry; client errors are expected traffic.
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Order service request error"
            );
        }

        let status = self.status_code();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "status": false, "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_http_statuses() {
        assert_eq!(
            ApiError::NotFound("basket not found".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Validation("items field is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Policy("basket is empty".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("missing token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Transient("lock timeout".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn client_errors_keep_their_message() {
        let err = ApiError::Policy("shop Horns & Hooves is not accepting orders".into());
        assert_eq!(
            err.to_string(),
            "shop Horns & Hooves is not accepting orders"
        );
    }

    #[test]
    fn repository_not_found_stays_a_database_error() {
        // Handlers produce their own NotFound messages; a repo-level miss
        // bubbling up uncaught is a bug, not a 404.
        let err: ApiError = RepositoryError::NotFound.into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
