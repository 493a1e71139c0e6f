use std::time::Duration;

use serde::{Serialize, Serializer};

/// Why a single source produced no data this tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("command failed: {0}")]
    Process(String),
    #[error("adapter task aborted: {0}")]
    Aborted(String),
    #[error("not supported on this platform")]
    Unsupported,
}

/// Outcome of one adapter call: a value, or an explicit failure marker.
///
/// Formatting a failure ("--", "Error") is left to whoever displays it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Reading<T> {
    Valid(T),
    Failure(#[serde(serialize_with = "serialize_reason")] FetchError),
}

fn serialize_reason<S: Serializer>(err: &FetchError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(err)
}

impl<T> Reading<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Reading::Valid(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_valid()
    }

    pub fn valid(&self) -> Option<&T> {
        match self {
            Reading::Valid(v) => Some(v),
            Reading::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FetchError> {
        match self {
            Reading::Valid(_) => None,
            Reading::Failure(e) => Some(e),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reading<U> {
        match self {
            Reading::Valid(v) => Reading::Valid(f(v)),
            Reading::Failure(e) => Reading::Failure(e),
        }
    }
}

impl<T> From<Result<T, FetchError>> for Reading<T> {
    fn from(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(v) => Reading::Valid(v),
            Err(e) => Reading::Failure(e),
        }
    }
}
