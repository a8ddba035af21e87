use crate::units::Timestamp;
use serde::Serialize;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced by the tracking core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The TLE could not be fetched or parsed. Fatal to propagation until a reload succeeds.
    #[error("TLE source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("No TLE has been loaded yet")]
    NotInitialized,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Propagation diverged: {0}")]
    PropagationDiverged(String),

    #[error("No pass found within {window_secs} s after {start}")]
    NoPassFound { start: Timestamp, window_secs: f64 },
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Error::SourceUnavailable(_) => "source-unavailable",
            Error::NotInitialized => "not-initialized",
            Error::InvalidArgument(_) => "invalid-argument",
            Error::PropagationDiverged(_) => "propagation-diverged",
            Error::NoPassFound { .. } => "no-pass-found",
        }
    }

    /// Server-side preconditions are 5xx, everything the caller can fix is 4xx
    pub fn http_status(&self) -> u16 {
        match self {
            Error::SourceUnavailable(_) => 503,
            Error::NotInitialized => 500,
            Error::InvalidArgument(_) => 400,
            Error::PropagationDiverged(_) => 422,
            Error::NoPassFound { .. } => 404,
        }
    }
}

/// JSON body returned to HTTP clients alongside [`Error::http_status`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub error: &'static str,
    pub message: String,
}

impl From<&Error> for ErrorBody {
    fn from(e: &Error) -> Self {
        ErrorBody {
            status: e.http_status(),
            error: e.kind(),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn distinct_statuses() {
        let errors = [
            Error::SourceUnavailable("timeout".into()),
            Error::NotInitialized,
            Error::invalid("step"),
            Error::PropagationDiverged("stale".into()),
            Error::NoPassFound {
                start: Timestamp::epoch(),
                window_secs: 1.0,
            },
        ];
        let statuses: HashSet<u16> = errors.iter().map(Error::http_status).collect();
        assert_eq!(statuses.len(), errors.len());

        for e in &errors[..2] {
            assert!(e.http_status() >= 500);
        }
        for e in &errors[2..] {
            assert!((400..500).contains(&e.http_status()));
        }
    }

    #[test]
    fn error_body() {
        let body = ErrorBody::from(&Error::invalid("latitude 91 out of range"));
        assert_eq!(body.status, 400);
        assert_eq!(body.error, "invalid-argument");
        assert_eq!(body.message, "Invalid argument: latitude 91 out of range");
    }
}
