use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::{bracket::BracketError, dao::storage::StorageError};

/// Failures of the tournament service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A storage call failed.
    #[error("tournament storage failed")]
    Unavailable(#[source] StorageError),
    /// No storage backend is connected yet.
    #[error("tournament storage is offline")]
    Degraded,
    /// The request can never succeed as sent.
    #[error("{0}")]
    InvalidInput(String),
    /// The request conflicts with the current bracket.
    #[error("{0}")]
    InvalidState(String),
    /// Unknown tournament or match, or one owned by another account.
    #[error("{0}")]
    NotFound(String),
    /// The bracket would have been left inconsistent.
    #[error("{0}")]
    Internal(String),
    /// A storage call did not answer in time.
    #[error("tournament storage timed out")]
    Timeout,
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<BracketError> for ServiceError {
    fn from(err: BracketError) -> Self {
        let message = err.to_string();
        match err {
            BracketError::InvalidRoster { .. }
            | BracketError::UnsupportedStyle { .. }
            | BracketError::TiedScore { .. }
            | BracketError::InvalidWinner { .. } => ServiceError::InvalidInput(message),
            BracketError::MatchNotFound { .. } => ServiceError::NotFound(message),
            BracketError::UndeterminedMatch { .. } | BracketError::MatchAlreadyCompleted { .. } => {
                ServiceError::InvalidState(message)
            }
            BracketError::PropagationInvariantViolation { .. } => ServiceError::Internal(message),
        }
    }
}

/// Error returned by a handler, rendered as `{code, message}`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or impossible request.
    #[error("{0}")]
    BadRequest(String),
    /// Missing or malformed account identity.
    #[error("{0}")]
    Unauthorized(String),
    /// Unknown tournament or match.
    #[error("{0}")]
    NotFound(String),
    /// The bracket is not in a state that accepts the request.
    #[error("{0}")]
    Conflict(String),
    /// Storage is offline, failing or slow.
    #[error("{0}")]
    ServiceUnavailable(String),
    /// The bracket engine detected an inconsistency.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status sent to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::ServiceUnavailable(_) => "storage_unavailable",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        if let ServiceError::Unavailable(source) = &err {
            warn!(error = %source, "storage call failed");
        }

        let message = err.to_string();
        match err {
            ServiceError::Unavailable(_) | ServiceError::Degraded | ServiceError::Timeout => {
                AppError::ServiceUnavailable(message)
            }
            ServiceError::InvalidInput(_) => AppError::BadRequest(message),
            ServiceError::InvalidState(_) => AppError::Conflict(message),
            ServiceError::NotFound(_) => AppError::NotFound(message),
            ServiceError::Internal(_) => AppError::Internal(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            error!(error = %self, "request failed");
        }

        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn bracket_errors_map_to_http_statuses() {
        let id = Uuid::new_v4();
        let cases = [
            (BracketError::TiedScore { id, score: 2 }, StatusCode::BAD_REQUEST),
            (BracketError::MatchNotFound { id }, StatusCode::NOT_FOUND),
            (BracketError::UndeterminedMatch { id }, StatusCode::CONFLICT),
            (
                BracketError::PropagationInvariantViolation {
                    reason: "no slot".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = AppError::from(ServiceError::from(err)).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn offline_storage_is_unavailable() {
        let err = AppError::from(ServiceError::Degraded);
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code(), "storage_unavailable");
        assert_eq!(err.to_string(), "tournament storage is offline");
    }
}
