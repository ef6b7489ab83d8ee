//! Conversions from external infrastructure errors into domain errors.

use recreviews_domain::{ApiError, RecReviewsError};
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub RecReviewsError);

impl From<InfraError> for RecReviewsError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<RecReviewsError> for InfraError {
    fn from(value: RecReviewsError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoRecReviewsError {
    fn into_recreviews(self) -> RecReviewsError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → RecReviewsError */
/* -------------------------------------------------------------------------- */

impl IntoRecReviewsError for SqlError {
    fn into_recreviews(self) -> RecReviewsError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        RecReviewsError::Storage("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        RecReviewsError::Storage("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        RecReviewsError::Storage("unique constraint violation".into())
                    }
                    _ => RecReviewsError::Storage(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => RecReviewsError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                RecReviewsError::Storage(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                RecReviewsError::Storage(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => RecReviewsError::Storage(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => RecReviewsError::Storage(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_recreviews())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → RecReviewsError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(RecReviewsError::Storage(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ApiError */
/* -------------------------------------------------------------------------- */

/// Classify a transport-level failure.
///
/// Every reqwest failure is an `Unknown` outcome wrapping the transport
/// message; only the prefix differs.
pub fn transport_error(err: &HttpError) -> ApiError {
    if err.is_timeout() {
        return ApiError::Unknown(format!("request timed out: {err}"));
    }

    if err.is_connect() {
        return ApiError::Unknown(format!("connection failure: {err}"));
    }

    ApiError::Unknown(err.to_string())
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(RecReviewsError::Api(transport_error(&value)))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
