//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Ward                                   │
//! │                                                                         │
//! │  Handler → Result<T, ApiError>                                          │
//! │                                                                         │
//! │  ValidationErrors ──┐                                                   │
//! │  CoreError ─────────┼──► ApiError::Validation ──► 400 ["msg", ...]      │
//! │  JsonRejection ─────┘                                                   │
//! │                                                                         │
//! │  DbError::NotFound ─────► ApiError::NotFound ───► 404 {code, message}   │
//! │  DbError::UniqueViolation ──► Validation ───────► 400 ["...exists"]     │
//! │  DbError (anything else) ─► ApiError::Persistence ► 500 {code, message} │
//! │                                  │                                      │
//! │                                  └─► FailureRecord extension            │
//! │                                      (written to the error log)         │
//! │                                                                         │
//! │  Auth layer ─────────────► Unauthorized / Forbidden ► 401 / 403         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};
use ward_core::{CoreError, ValidationError, ValidationErrors};
use ward_db::repository::patient::columns::{EMAIL_FOLDED, IDENTITY_CARD_FOLDED};
use ward_db::DbError;

/// Errors a handler can end with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Field or business-rule messages, returned as a JSON array.
    #[error("Invalid request: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing, malformed or expired bearer token.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Valid token without the required role.
    #[error("Authorization failed: {0}")]
    Forbidden(String),

    /// The store rejected or failed an operation.
    #[error("Database error: {0}")]
    Persistence(DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable error codes for non-validation responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    Unauthorized,
    Forbidden,
    DatabaseError,
    Internal,
}

/// Body of every non-400 error response.
///
/// ```json
/// { "code": "NOT_FOUND", "message": "Patient not found: 42" }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// Detail of an unexpected failure, attached to the response so the
/// error-log middleware can persist it after the handler has finished.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub message: String,
    pub stack_trace: Option<String>,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(vec![message.into()])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Persistence(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (code, message) = match self {
            ApiError::Validation(messages) => {
                return (status, Json(messages)).into_response();
            }
            ApiError::NotFound(msg) => (ErrorCode::NotFound, msg),
            ApiError::Unauthorized(msg) => {
                warn!(reason = %msg, "Rejected unauthenticated request");
                (ErrorCode::Unauthorized, "Authentication required".to_string())
            }
            ApiError::Forbidden(msg) => {
                warn!(reason = %msg, "Rejected unauthorized request");
                (ErrorCode::Forbidden, "Insufficient role".to_string())
            }
            ApiError::Persistence(err) => {
                let record = FailureRecord {
                    message: err.to_string(),
                    stack_trace: Some(format!("{:?}", err)),
                };
                return failure_response(ErrorCode::DatabaseError, "Database operation failed", record);
            }
            ApiError::Internal(detail) => {
                let record = FailureRecord {
                    message: detail,
                    stack_trace: None,
                };
                return failure_response(ErrorCode::Internal, "Internal server error", record);
            }
        };

        (status, Json(ErrorBody { code, message })).into_response()
    }
}

fn failure_response(code: ErrorCode, public: &str, record: FailureRecord) -> Response {
    error!(error = %record.message, "Request failed");

    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            code,
            message: public.to_string(),
        }),
    )
        .into_response();

    response.extensions_mut().insert(record);
    response
}

// =============================================================================
// Conversions
// =============================================================================

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        if err.is_unique_violation_on("patients", EMAIL_FOLDED)
            || err.is_unique_violation_on("patients", IDENTITY_CARD_FOLDED)
        {
            return CoreError::DuplicatePatient.into();
        }

        match err {
            DbError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} not found: {}", entity, id))
            }
            DbError::UniqueViolation { field, .. } => {
                ApiError::validation(format!("{} already exists", field))
            }
            other => ApiError::Persistence(other),
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Validation(err.messages())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors.messages())
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::validation(error.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_index_maps_to_business_rule() {
        let err: ApiError = DbError::duplicate("patients.email_folded", "unknown").into();
        match err {
            ApiError::Validation(messages) => {
                assert_eq!(messages, vec!["Email or Identity Card number already exists"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err: ApiError = DbError::not_found("Patient", 7).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_store_failure_carries_failure_record() {
        let err: ApiError = DbError::PoolExhausted.into();
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let record = response.extensions().get::<FailureRecord>().unwrap();
        assert_eq!(record.message, "Connection pool exhausted");
        assert_eq!(record.stack_trace.as_deref(), Some("PoolExhausted"));
    }

    #[test]
    fn test_validation_has_no_failure_record() {
        let response = ApiError::validation("First Name is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.extensions().get::<FailureRecord>().is_none());
    }
}
