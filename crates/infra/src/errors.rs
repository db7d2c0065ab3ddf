//! Conversions from external infrastructure errors into domain errors.

use punchclock_domain::PunchClockError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can
/// be converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub PunchClockError);

impl From<InfraError> for PunchClockError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<PunchClockError> for InfraError {
    fn from(value: PunchClockError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → PunchClockError */
/* -------------------------------------------------------------------------- */

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        let mapped = match value {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => {
                        PunchClockError::Storage("database is busy".into())
                    }
                    ErrorCode::DatabaseLocked => {
                        PunchClockError::Storage("database is locked".into())
                    }
                    ErrorCode::ConstraintViolation => {
                        PunchClockError::Storage(format!("constraint violation: {message}"))
                    }
                    _ => PunchClockError::Storage(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => {
                PunchClockError::NotFound("no rows returned by query".into())
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                PunchClockError::Storage(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                PunchClockError::Storage(format!("invalid column type: {ty}"))
            }
            RE::InvalidQuery => PunchClockError::Storage("invalid SQL query".into()),
            other => PunchClockError::Storage(other.to_string()),
        };

        InfraError(mapped)
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → PunchClockError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(PunchClockError::Storage(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → PunchClockError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        let mapped = if value.is_timeout() {
            PunchClockError::Remote(format!("http timeout: {value}"))
        } else if value.is_connect() {
            PunchClockError::Remote(format!("http connect error: {value}"))
        } else if value.is_builder() {
            PunchClockError::Internal(format!("http client misconfigured: {value}"))
        } else {
            PunchClockError::Remote(format!("http error: {value}"))
        };

        InfraError(mapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rows_maps_to_not_found() {
        let err: InfraError = SqlError::QueryReturnedNoRows.into();
        assert!(matches!(err.0, PunchClockError::NotFound(_)));
    }

    #[test]
    fn invalid_query_maps_to_storage() {
        let err: InfraError = SqlError::InvalidQuery.into();
        assert!(matches!(err.0, PunchClockError::Storage(_)));
    }
}
