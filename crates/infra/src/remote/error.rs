//! Remote transport error classification.
//!
//! HTTP failures are folded into a small set of classes so the heartbeat
//! can report a stable `error_class` and the sync path can decide what is
//! retryable without inspecting status codes everywhere.

use punchclock_domain::PunchClockError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    /// Could not reach the endpoint at all (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint rejected our credentials (401/403).
    #[error("authorization rejected: {0}")]
    Auth(String),

    /// The resource does not exist (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The endpoint rejected the request body (4xx other than auth/404).
    #[error("request rejected: {0}")]
    Validation(String),

    /// The endpoint failed internally (5xx).
    #[error("server error: {0}")]
    Server(String),
}

impl RemoteError {
    /// Short stable tag for status reporting.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::Server(_) => "server",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Classify a non-success HTTP status with its response body.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Auth(format!("{status}: {body}")),
            404 => Self::NotFound(format!("{status}: {body}")),
            400..=499 => Self::Validation(format!("{status}: {body}")),
            _ => Self::Server(format!("{status}: {body}")),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() || value.is_connect() {
            Self::Network(value.to_string())
        } else if let Some(status) = value.status() {
            Self::from_status(status, value.to_string())
        } else {
            Self::Network(value.to_string())
        }
    }
}

impl From<RemoteError> for PunchClockError {
    fn from(value: RemoteError) -> Self {
        match value {
            RemoteError::NotFound(msg) => PunchClockError::NotFound(msg),
            other => PunchClockError::Remote(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification_covers_the_interesting_codes() {
        let auth = RemoteError::from_status(reqwest::StatusCode::UNAUTHORIZED, "nope".into());
        assert_eq!(auth.error_class(), "auth");

        let missing = RemoteError::from_status(reqwest::StatusCode::NOT_FOUND, "gone".into());
        assert!(missing.is_not_found());

        let bad = RemoteError::from_status(reqwest::StatusCode::UNPROCESSABLE_ENTITY, "".into());
        assert_eq!(bad.error_class(), "validation");

        let down = RemoteError::from_status(reqwest::StatusCode::BAD_GATEWAY, "".into());
        assert_eq!(down.error_class(), "server");
    }

    #[test]
    fn not_found_maps_to_domain_not_found() {
        let err: PunchClockError = RemoteError::NotFound("row".into()).into();
        assert!(matches!(err, PunchClockError::NotFound(_)));

        let err: PunchClockError = RemoteError::Server("boom".into()).into();
        assert!(matches!(err, PunchClockError::Remote(_)));
    }
}
