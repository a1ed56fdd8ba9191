//! Error types for the Hydro Admin data layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// PostgreSQL SQLSTATE for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL SQLSTATE for `foreign_key_violation`
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// PostgreSQL SQLSTATE for `check_violation`
const CHECK_VIOLATION: &str = "23514";

/// Stable error codes exposed to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Duplicate,
    ForeignKey,
    BadValue,
    DbFailure,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error in {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// Constraint-level classification of a driver error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConstraintKind {
    Unique,
    ForeignKey,
    Check,
}

/// Map a PostgreSQL SQLSTATE to the constraint family it reports
pub(crate) fn classify_sqlstate(code: &str) -> Option<ConstraintKind> {
    match code {
        UNIQUE_VIOLATION => Some(ConstraintKind::Unique),
        FOREIGN_KEY_VIOLATION => Some(ConstraintKind::ForeignKey),
        CHECK_VIOLATION => Some(ConstraintKind::Check),
        _ => None,
    }
}

/// Translate a raw driver error into a typed domain error.
///
/// Returns `None` when the error is not a recognised constraint failure;
/// callers then wrap it generically with [`db_error`].
pub fn translate_db_error(err: &sqlx::Error, operation: &str) -> Option<AppError> {
    match err {
        sqlx::Error::RowNotFound => {
            Some(AppError::NotFound(format!("{}: record not found", operation)))
        }
        sqlx::Error::Database(db_err) => {
            let code = db_err.code()?;
            let constraint = db_err.constraint().unwrap_or("unknown constraint");
            match classify_sqlstate(&code)? {
                ConstraintKind::Unique => Some(AppError::Duplicate(format!(
                    "{}: value already exists ({})",
                    operation, constraint
                ))),
                ConstraintKind::ForeignKey => Some(AppError::ForeignKeyViolation(format!(
                    "{}: referenced record does not exist ({})",
                    operation, constraint
                ))),
                ConstraintKind::Check => Some(AppError::Validation(format!(
                    "{}: value rejected by {}",
                    operation, constraint
                ))),
            }
        }
        _ => None,
    }
}

/// Translate or wrap a driver error, tagging it with the failing operation
pub fn db_error(err: sqlx::Error, operation: &'static str) -> AppError {
    match translate_db_error(&err, operation) {
        Some(translated) => translated,
        None => AppError::Database {
            operation,
            source: err,
        },
    }
}

/// Attach an operation name to a `sqlx` result
pub trait DbResultExt<T> {
    fn op(self, operation: &'static str) -> AppResult<T>;
}

impl<T> DbResultExt<T> for Result<T, sqlx::Error> {
    fn op(self, operation: &'static str) -> AppResult<T> {
        self.map_err(|e| db_error(e, operation))
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl AppError {
    /// HTTP status and client-facing code for this error
    pub fn status(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            AppError::Duplicate(_) => (StatusCode::CONFLICT, ErrorCode::Duplicate),
            AppError::ForeignKeyViolation(_) => (StatusCode::BAD_REQUEST, ErrorCode::ForeignKey),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
            AppError::Database { .. } => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        let message = match &self {
            AppError::Database { operation, source } => {
                tracing::error!(operation = %operation, "Database error: {:?}", source);
                "Database error".to_string()
            }
            AppError::NotFound(msg)
            | AppError::Duplicate(msg)
            | AppError::ForeignKeyViolation(msg)
            | AppError::Validation(msg) => msg.clone(),
        };

        (status, Json(ErrorResponse { code, message })).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_sqlstate() {
        assert_eq!(classify_sqlstate("23505"), Some(ConstraintKind::Unique));
        assert_eq!(classify_sqlstate("23503"), Some(ConstraintKind::ForeignKey));
        assert_eq!(classify_sqlstate("23514"), Some(ConstraintKind::Check));
        assert_eq!(classify_sqlstate("40001"), None);
    }

    #[test]
    fn test_row_not_found_translates_to_not_found() {
        let err = translate_db_error(&sqlx::Error::RowNotFound, "get shutdown");
        assert!(matches!(err, Some(AppError::NotFound(msg)) if msg.starts_with("get shutdown")));
    }

    #[test]
    fn test_unrecognised_error_is_wrapped_with_operation() {
        assert!(translate_db_error(&sqlx::Error::PoolTimedOut, "list contacts").is_none());

        let err = db_error(sqlx::Error::PoolTimedOut, "list contacts");
        match err {
            AppError::Database { operation, .. } => assert_eq!(operation, "list contacts"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Duplicate("x".into()), StatusCode::CONFLICT),
            (AppError::ForeignKeyViolation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                db_error(sqlx::Error::PoolClosed, "add shutdown"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
